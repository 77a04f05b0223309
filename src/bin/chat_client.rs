// src/bin/chat_client.rs

//! Terminal chat client for the order conversation.
//!
//! After logging in it refetches the message log every two seconds and
//! renders whatever the server returns, in the order it returns it. A typed
//! line is consumed (the compose buffer clears) before the send resolves; a
//! failed send is reported but the draft is not restored, which is the same
//! optimistic behavior the storefront UI ships with.

use anyhow::{anyhow, Context, Result};
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine;
use serde_json::{json, Value};
use std::path::Path;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};

const POLL_INTERVAL: Duration = Duration::from_secs(2);

struct ChatSession {
  http: reqwest::Client,
  base_url: String,
  rendered: usize,
}

impl ChatSession {
  async fn login(base_url: String, phone: &str, pin: &str) -> Result<Self> {
    let http = reqwest::Client::builder()
      .cookie_store(true)
      .build()
      .context("building http client")?;

    let resp = http
      .post(format!("{}/customer/login", base_url))
      .json(&json!({"phone": phone, "pin": pin}))
      .send()
      .await
      .context("login request")?;

    if !resp.status().is_success() {
      let status = resp.status();
      let body: Value = resp.json().await.unwrap_or(Value::Null);
      return Err(anyhow!(
        "login failed ({}): {}",
        status,
        body.get("error").and_then(Value::as_str).unwrap_or("unknown error")
      ));
    }

    let body: Value = resp.json().await.context("login response body")?;
    let order_id = body.get("orderId").and_then(Value::as_str).unwrap_or("?");
    println!("logged in; chatting about order {}", order_id);

    Ok(Self {
      http,
      base_url,
      rendered: 0,
    })
  }

  /// Fetches the log and prints anything not yet rendered, in server order.
  async fn poll(&mut self) -> Result<()> {
    let resp = self
      .http
      .get(format!("{}/customer/messages", self.base_url))
      .send()
      .await
      .context("poll request")?;

    if !resp.status().is_success() {
      return Err(anyhow!("poll failed: {}", resp.status()));
    }

    let body: Value = resp.json().await.context("poll body")?;
    let messages = body
      .get("messages")
      .and_then(Value::as_array)
      .cloned()
      .unwrap_or_default();

    for message in messages.iter().skip(self.rendered) {
      let role = message.get("senderRole").and_then(Value::as_str).unwrap_or("customer");
      let text = message.get("text").and_then(Value::as_str).unwrap_or("");
      match message.get("imageUrl").and_then(Value::as_str) {
        Some(url) if text.is_empty() => println!("[{}] <image> {}", role, url),
        Some(url) => println!("[{}] {} <image> {}", role, text, url),
        None => println!("[{}] {}", role, text),
      }
    }
    self.rendered = messages.len();
    Ok(())
  }

  async fn send(&self, payload: Value) -> Result<()> {
    let resp = self
      .http
      .post(format!("{}/customer/messages", self.base_url))
      .json(&payload)
      .send()
      .await
      .context("send request")?;

    if !resp.status().is_success() {
      let status = resp.status();
      let body: Value = resp.json().await.unwrap_or(Value::Null);
      return Err(anyhow!(
        "send failed ({}): {}",
        status,
        body.get("error").and_then(Value::as_str).unwrap_or("unknown error")
      ));
    }
    Ok(())
  }

  async fn logout(&self) {
    let _ = self.http.post(format!("{}/customer/logout", self.base_url)).send().await;
  }
}

fn data_url_for_file(path: &str) -> Result<String> {
  let bytes = std::fs::read(path).with_context(|| format!("reading {}", path))?;
  let content_type = match Path::new(path)
    .extension()
    .and_then(|e| e.to_str())
    .map(|e| e.to_ascii_lowercase())
    .as_deref()
  {
    Some("png") => "image/png",
    Some("webp") => "image/webp",
    Some("gif") => "image/gif",
    Some("jpg") | Some("jpeg") => "image/jpeg",
    other => return Err(anyhow!("unsupported image extension: {:?}", other)),
  };
  // No client-side recompression here; the server rejects oversized images
  // with an actionable 413.
  Ok(format!("data:{};base64,{}", content_type, BASE64_STANDARD.encode(bytes)))
}

fn usage() -> ! {
  eprintln!("usage: storefront_chat <base_url> <phone> <pin>");
  eprintln!("  lines you type are sent as messages");
  eprintln!("  /image <path>   send a jpeg/png/webp/gif file");
  eprintln!("  /quit           log out and exit");
  std::process::exit(2);
}

#[tokio::main]
async fn main() -> Result<()> {
  let args: Vec<String> = std::env::args().skip(1).collect();
  let (base_url, phone, pin) = match args.as_slice() {
    [base_url, phone, pin] => (base_url.trim_end_matches('/').to_string(), phone.clone(), pin.clone()),
    _ => usage(),
  };

  let mut session = ChatSession::login(base_url, &phone, &pin).await?;
  session.poll().await?;

  let mut interval = tokio::time::interval(POLL_INTERVAL);
  let mut lines = BufReader::new(tokio::io::stdin()).lines();

  loop {
    tokio::select! {
      _ = interval.tick() => {
        if let Err(e) = session.poll().await {
          eprintln!("! {}", e);
        }
      }
      line = lines.next_line() => {
        let Some(line) = line.context("reading stdin")? else {
          break;
        };
        let line = line.trim().to_string();
        if line.is_empty() {
          continue;
        }

        if line == "/quit" {
          break;
        }

        let payload = if let Some(path) = line.strip_prefix("/image ") {
          match data_url_for_file(path.trim()) {
            Ok(data_url) => json!({"imageDataUrl": data_url}),
            Err(e) => {
              eprintln!("! {}", e);
              continue;
            }
          }
        } else {
          json!({"text": line})
        };

        // The line is already consumed; on failure we surface the error and
        // deliberately do not restore the draft.
        if let Err(e) = session.send(payload).await {
          eprintln!("! {}", e);
        } else if let Err(e) = session.poll().await {
          eprintln!("! {}", e);
        }
      }
    }
  }

  session.logout().await;
  println!("logged out");
  Ok(())
}
