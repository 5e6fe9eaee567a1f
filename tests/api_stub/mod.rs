#![allow(dead_code)]

use std::io::Read as _;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use serde_json::Value;

#[derive(Debug, Clone, Default)]
pub struct ApiStubConfig {
    /// The paginated endpoint answers 500 so clients must fall back.
    pub paginated_fails: bool,
    /// Order submissions are rejected with this server message.
    pub order_rejection: Option<String>,
}

#[derive(Debug, Default)]
pub struct RequestCounts {
    pub all_books: AtomicUsize,
    pub paginated: AtomicUsize,
    pub orders: AtomicUsize,
}

impl RequestCounts {
    pub fn all_books(&self) -> usize {
        self.all_books.load(Ordering::SeqCst)
    }

    pub fn paginated(&self) -> usize {
        self.paginated.load(Ordering::SeqCst)
    }

    pub fn orders(&self) -> usize {
        self.orders.load(Ordering::SeqCst)
    }
}

/// In-process bookstore API stub serving the fixture catalog.
pub struct ApiStub {
    pub base_url: String,
    pub counts: Arc<RequestCounts>,
    shutdown_tx: Option<mpsc::Sender<()>>,
    handle: Option<thread::JoinHandle<()>>,
}

impl ApiStub {
    pub fn spawn(config: ApiStubConfig) -> Self {
        let server = tiny_http::Server::http("127.0.0.1:0").expect("start api stub server");
        let addr = server.server_addr();
        let base_url = format!("http://{addr}/api");
        let counts = Arc::new(RequestCounts::default());

        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();
        let thread_counts = Arc::clone(&counts);

        let handle = thread::spawn(move || {
            loop {
                if shutdown_rx.try_recv().is_ok() {
                    break;
                }

                let mut request = match server.recv_timeout(Duration::from_millis(50)) {
                    Ok(Some(req)) => req,
                    Ok(None) => continue,
                    Err(_) => break,
                };

                let url = request.url().to_string();
                let path = url.split('?').next().unwrap_or(&url).to_string();
                let is_get = request.method() == &tiny_http::Method::Get;
                let is_post = request.method() == &tiny_http::Method::Post;

                if is_get && path == "/api/books" {
                    thread_counts.all_books.fetch_add(1, Ordering::SeqCst);
                    let books = match query_param_str(&url, "category") {
                        Some(category) => filter_books(|book| {
                            book.get("category").and_then(Value::as_str) == Some(category.as_str())
                        }),
                        None => fixture_books(),
                    };
                    let _ = request.respond(json_response(200, books.to_string()));
                    continue;
                }

                if is_get && path == "/api/books/search" {
                    let keyword = query_param_str(&url, "keyword")
                        .unwrap_or_default()
                        .to_lowercase();
                    let books = filter_books(|book| {
                        ["title", "author", "description"].iter().any(|field| {
                            book.get(field)
                                .and_then(Value::as_str)
                                .is_some_and(|text| text.to_lowercase().contains(&keyword))
                        })
                    });
                    let _ = request.respond(json_response(200, books.to_string()));
                    continue;
                }

                if is_get && path == "/api/books/paginated" {
                    thread_counts.paginated.fetch_add(1, Ordering::SeqCst);
                    if config.paginated_fails {
                        let _ = request.respond(json_response(
                            500,
                            r#"{"message":"pagination disabled"}"#.to_owned(),
                        ));
                        continue;
                    }
                    let page = query_param(&url, "page").unwrap_or(0);
                    let size = query_param(&url, "size").unwrap_or(12).max(1);
                    let _ = request.respond(json_response(200, paginated_books(page, size)));
                    continue;
                }

                if is_get && path == "/api/packs/active" {
                    let _ = request.respond(json_response(200, fixture_packs().to_string()));
                    continue;
                }

                if is_get && path == "/api/offers/daily" {
                    let _ = request.respond(json_response(200, fixture_offers().to_string()));
                    continue;
                }

                if is_get && path.starts_with("/api/packs/") {
                    let id = path.trim_start_matches("/api/packs/");
                    let body = fixture_packs()
                        .as_array()
                        .and_then(|packs| {
                            packs
                                .iter()
                                .find(|pack| pack.get("id").and_then(Value::as_i64).map(|v| v.to_string()).as_deref() == Some(id))
                                .cloned()
                        });
                    match body {
                        Some(pack) => {
                            let _ = request.respond(json_response(200, pack.to_string()));
                        }
                        None => {
                            let _ = request.respond(json_response(
                                404,
                                r#"{"message":"pack not found"}"#.to_owned(),
                            ));
                        }
                    }
                    continue;
                }

                if is_post && path == "/api/orders" {
                    let mut body = String::new();
                    if request.as_reader().read_to_string(&mut body).is_err() {
                        let _ = request.respond(json_response(
                            400,
                            r#"{"message":"invalid request body"}"#.to_owned(),
                        ));
                        continue;
                    }
                    if serde_json::from_str::<Value>(&body).is_err() {
                        let _ = request.respond(json_response(
                            400,
                            r#"{"message":"invalid json"}"#.to_owned(),
                        ));
                        continue;
                    }
                    thread_counts.orders.fetch_add(1, Ordering::SeqCst);

                    if let Some(message) = &config.order_rejection {
                        let body = serde_json::json!({ "message": message });
                        let _ = request.respond(json_response(422, body.to_string()));
                        continue;
                    }
                    let body = serde_json::json!({
                        "id": 1001,
                        "orderNumber": "PW-1001",
                        "status": "PENDING"
                    });
                    let _ = request.respond(json_response(201, body.to_string()));
                    continue;
                }

                let _ = request.respond(json_response(
                    404,
                    r#"{"message":"not found"}"#.to_owned(),
                ));
            }
        });

        Self {
            base_url,
            counts,
            shutdown_tx: Some(shutdown_tx),
            handle: Some(handle),
        }
    }
}

impl Drop for ApiStub {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn json_response(status: u16, body: String) -> tiny_http::Response<std::io::Cursor<Vec<u8>>> {
    let header = tiny_http::Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..])
        .expect("build header");
    tiny_http::Response::from_string(body)
        .with_status_code(status)
        .with_header(header)
}

fn query_param(url: &str, name: &str) -> Option<usize> {
    query_param_str(url, name)?.parse().ok()
}

fn query_param_str(url: &str, name: &str) -> Option<String> {
    let (_, query) = url.split_once('?')?;
    for pair in query.split('&') {
        let (key, value) = pair.split_once('=')?;
        if key == name {
            return Some(value.replace('+', " ").replace("%20", " "));
        }
    }
    None
}

fn filter_books(predicate: impl Fn(&Value) -> bool) -> Value {
    let books = fixture_books();
    let filtered: Vec<Value> = books
        .as_array()
        .expect("fixture books are an array")
        .iter()
        .filter(|book| predicate(*book))
        .cloned()
        .collect();
    Value::Array(filtered)
}

fn paginated_books(page: usize, size: usize) -> String {
    let books = fixture_books();
    let all = books.as_array().expect("fixture books are an array");
    let items: Vec<Value> = all.iter().skip(page * size).take(size).cloned().collect();
    serde_json::json!({
        "items": items,
        "totalPages": all.len().div_ceil(size),
        "totalElements": all.len(),
    })
    .to_string()
}

/// The fixture catalog, in the shapes the real backend serves.
pub fn fixture_books() -> Value {
    serde_json::json!([
        {
            "id": 1,
            "title": "Clean Code",
            "author": "Robert C. Martin",
            "description": "A handbook of agile software craftsmanship",
            "price": 120,
            "originalPrice": 150,
            "category": "DEV",
            "language": "en",
            "isAvailable": true,
            "stock": 15
        },
        {
            "id": 2,
            "title": "1984",
            "author": "George Orwell",
            "description": "A classic dystopia",
            "price": 65,
            "category": "FICTION",
            "language": "en",
            "isAvailable": true,
            "stock": 12
        },
        {
            "id": 3,
            "title": "Le Petit Prince",
            "author": "Antoine de Saint-Exupéry",
            "description": "Un conte poétique et philosophique",
            "price": 45,
            "category": "KIDS",
            "language": "fr",
            "isAvailable": true,
            "stock": 25
        },
        {
            "id": 4,
            "title": "The Lean Startup",
            "author": "Eric Ries",
            "description": "How constant innovation creates radically successful businesses",
            "price": 89,
            "originalPrice": 110,
            "category": "BUSINESS",
            "language": "en",
            "isAvailable": false,
            "stock": 0
        },
        {
            "id": 5,
            "title": "L'Alchimiste",
            "author": "Paulo Coelho",
            "description": "Un voyage initiatique",
            "price": 70,
            "category": "FICTION",
            "language": "fr",
            "isAvailable": true,
            "stock": 14
        }
    ])
}

fn fixture_packs() -> Value {
    serde_json::json!([
        {
            "id": 1,
            "name": "Pack Développement",
            "title": "Pack Développement",
            "description": "Les meilleurs livres pour apprendre le développement",
            "price": 299,
            "originalPrice": 399,
            "active": true,
            "badge": "HOT",
            "isHighlight": true,
            "books": []
        },
        {
            "id": 2,
            "name": "Pack Business",
            "title": "Pack Business",
            "description": "Développez votre esprit entrepreneurial",
            "price": 249,
            "active": true,
            "badge": "SALE",
            "isHighlight": false,
            "books": []
        }
    ])
}

fn fixture_offers() -> Value {
    serde_json::json!([
        {
            "id": 1,
            "title": "Offre Spéciale Fiction",
            "description": "3 romans bestsellers à prix réduit",
            "price": 89,
            "originalPrice": 120,
            "discount": 25,
            "validUntil": "2030-12-31T00:00:00Z",
            "active": true,
            "books": []
        },
        {
            "id": 2,
            "title": "Bundle Développement Personnel",
            "description": "Transformez votre vie avec cette sélection",
            "price": 149,
            "originalPrice": 199,
            "discount": 30,
            "validUntil": "2020-01-01T00:00:00Z",
            "active": true,
            "books": []
        }
    ])
}
