//! Mock gallery site shared by the integration tests.
#![allow(dead_code)]

use std::path::Path;
use std::time::Duration;

use gallery_scrap::config::Config;
use gallery_scrap::request::Session;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const HANDLE: &str = "artist";

pub fn config_for(server: &MockServer, root: &Path) -> Config {
    Config {
        base_url: server.uri(),
        output_root: root.join("downloads"),
        database: root.join("meta.sqlite"),
        ..Config::default()
    }
}

pub fn session_for(server: &MockServer) -> Session {
    Session::new(&Config {
        base_url: server.uri(),
        ..Config::default()
    })
    .unwrap()
}

/// Serves `body` with status 200 for GET `route`.
pub async fn serve_page(server: &MockServer, route: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

pub async fn serve_bytes(server: &MockServer, route: &str, bytes: &[u8]) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(bytes.to_vec()))
        .mount(server)
        .await;
}

pub async fn serve_status(server: &MockServer, route: &str, status: u16) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(status))
        .mount(server)
        .await;
}

/// Answers one connection with a hand-written response: `head`, then each chunk `gap` apart,
/// then hangs up. Returns the origin to point a session at.
pub async fn serve_raw(head: &str, chunks: &[&str], gap: Duration) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let origin = format!("http://{}", listener.local_addr().unwrap());
    let head = head.to_string();
    let chunks: Vec<String> = chunks.iter().map(|c| c.to_string()).collect();

    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut request = [0u8; 4096];
        let _ = socket.read(&mut request).await;
        if socket.write_all(head.as_bytes()).await.is_err() {
            return;
        }
        for chunk in chunks {
            tokio::time::sleep(gap).await;
            if socket.write_all(chunk.as_bytes()).await.is_err() {
                return;
            }
            let _ = socket.flush().await;
        }
    });

    origin
}

/// A listing page with one figure per id. `tag` ends up in a comment so pages can be told apart.
pub fn listing_page(tag: &str, ids: &[&str], next: Option<&str>) -> String {
    let figures: String = ids
        .iter()
        .map(|id| {
            format!(
                r#"<figure id="sid-{id}" class="r-general t-image">
                     <b><u><a href="/view/{id}/"><img alt="Piece {id}" src="//t.example.net/{id}.jpg"></a></u></b>
                     <figcaption><p><a href="/view/{id}/">Piece {id}</a></p><p><i>by</i> <a href="/user/{HANDLE}/">Artist</a></p></figcaption>
                   </figure>"#
            )
        })
        .collect();
    let next = next
        .map(|href| format!(r#"<a class="button standard right" href="{href}">Next</a>"#))
        .unwrap_or_default();
    format!(
        r#"<html><body><!-- {tag} -->
           <section id="userpage-nav"><a href="/user/{HANDLE}/">Artist</a></section>
           <section id="gallery-0" class="gallery">{figures}</section>
           <div class="aligncenter">{next}</div>
           </body></html>"#
    )
}

/// A detail page with a download link, or a text-only page when `asset` is `None`.
pub fn detail_page(title: &str, asset: Option<&str>) -> String {
    match asset {
        Some(href) => format!(
            r#"<html><body>
               <div class="submission-title"><h2><p>{title}</p></h2></div>
               <div class="download"><a href="{href}">Download</a></div>
               <span class="popup_date" title="Jan 5th, 2023 08:15 PM">a while ago</span>
               </body></html>"#
        ),
        None => format!(
            r#"<html><body>
               <div class="submission-title"><h2><p>{title}</p></h2></div>
               <p>This submission is a story.</p>
               </body></html>"#
        ),
    }
}
