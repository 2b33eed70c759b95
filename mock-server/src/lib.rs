use std::{collections::BTreeMap, sync::Arc};

use axum::{
    extract::{Multipart, Path, Query, State},
    http::{StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use chrono::{Local, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::RwLock};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub isbn: Option<String>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub authors: Vec<Named>,
    #[serde(default)]
    pub publishers: Vec<Named>,
    #[serde(default)]
    pub publication_date: Option<NaiveDate>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Named {
    #[serde(default)]
    pub id: Option<i64>,
    pub name: String,
}

impl Named {
    fn new(name: &str) -> Self {
        Self {
            id: None,
            name: name.to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub status: u16,
    pub error: String,
    pub message: String,
    pub path: String,
    pub timestamp: NaiveDateTime,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ImportReport {
    pub books: Vec<Book>,
    pub errors: Vec<ImportError>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportError {
    pub line_number: u32,
    pub line_content: String,
    pub message: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchParams {
    pub id: Option<i64>,
    pub isbn: Option<String>,
    pub title: Option<String>,
    pub author: Option<String>,
    pub publisher: Option<String>,
    pub publication_date: Option<NaiveDate>,
}

#[derive(Deserialize)]
pub struct IsbnQuery {
    pub isbn: String,
}

#[derive(Default)]
pub struct Store {
    books: BTreeMap<i64, Book>,
    last_id: i64,
}

impl Store {
    fn insert(&mut self, mut book: Book) -> Book {
        self.last_id += 1;
        book.id = Some(self.last_id);
        self.books.insert(self.last_id, book.clone());
        book
    }
}

pub type Db = Arc<RwLock<Store>>;

/// A rejected request, rendered as the JSON error body clients expect.
pub struct Rejection {
    status: StatusCode,
    message: String,
    path: String,
}

impl Rejection {
    fn new(status: StatusCode, message: impl Into<String>, uri: &Uri) -> Self {
        Self {
            status,
            message: message.into(),
            path: uri.path().to_string(),
        }
    }
}

impl IntoResponse for Rejection {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            status: self.status.as_u16(),
            error: self
                .status
                .canonical_reason()
                .unwrap_or("Error")
                .to_string(),
            message: self.message,
            path: self.path,
            timestamp: Local::now().naive_local(),
        };
        (self.status, Json(body)).into_response()
    }
}

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(Store::default()));
    Router::new()
        .route("/book", get(search_books).post(save_book))
        .route("/book/{id}", delete(delete_book))
        .route("/book/import", post(import_books))
        .route("/open-library", get(open_library))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

fn contains(haystack: &str, needle: &Option<String>) -> bool {
    match needle.as_deref().map(str::trim) {
        Some(needle) if !needle.is_empty() => haystack
            .to_lowercase()
            .contains(&needle.to_lowercase()),
        _ => true,
    }
}

fn any_name_contains(names: &[Named], needle: &Option<String>) -> bool {
    let unconstrained = needle.as_deref().map_or(true, |n| n.trim().is_empty());
    unconstrained || names.iter().any(|n| contains(&n.name, needle))
}

fn matches(book: &Book, params: &SearchParams) -> bool {
    params.id.map_or(true, |id| book.id == Some(id))
        && params
            .isbn
            .as_deref()
            .map_or(true, |isbn| book.isbn.as_deref() == Some(isbn))
        && contains(&book.title, &params.title)
        && any_name_contains(&book.authors, &params.author)
        && any_name_contains(&book.publishers, &params.publisher)
        && params
            .publication_date
            .map_or(true, |date| book.publication_date == Some(date))
}

async fn search_books(State(db): State<Db>, Query(params): Query<SearchParams>) -> Json<Vec<Book>> {
    let store = db.read().await;
    Json(
        store
            .books
            .values()
            .filter(|book| matches(book, &params))
            .cloned()
            .collect(),
    )
}

async fn save_book(
    State(db): State<Db>,
    uri: Uri,
    Json(book): Json<Book>,
) -> Result<(StatusCode, Json<Book>), Rejection> {
    if book.title.trim().is_empty() {
        return Err(Rejection::new(StatusCode::BAD_REQUEST, "Title is required", &uri));
    }
    let mut store = db.write().await;
    match book.id {
        Some(id) => {
            let existing = store.books.get_mut(&id).ok_or_else(|| {
                Rejection::new(StatusCode::NOT_FOUND, format!("Book {id} not found"), &uri)
            })?;
            *existing = book.clone();
            Ok((StatusCode::OK, Json(book)))
        }
        None => Ok((StatusCode::CREATED, Json(store.insert(book)))),
    }
}

async fn delete_book(
    State(db): State<Db>,
    uri: Uri,
    Path(id): Path<i64>,
) -> Result<StatusCode, Rejection> {
    let mut store = db.write().await;
    store
        .books
        .remove(&id)
        .map(|_| StatusCode::NO_CONTENT)
        .ok_or_else(|| Rejection::new(StatusCode::NOT_FOUND, format!("Book {id} not found"), &uri))
}

/// The fixed catalogue the Open Library stand-in knows about.
pub fn catalogue() -> Vec<Book> {
    vec![Book {
        id: None,
        isbn: Some("9780441172719".to_string()),
        title: "Dune".to_string(),
        authors: vec![Named::new("Frank Herbert")],
        publishers: vec![Named::new("Ace")],
        publication_date: NaiveDate::from_ymd_opt(1990, 9, 1),
    }]
}

async fn open_library(uri: Uri, Query(query): Query<IsbnQuery>) -> Result<Json<Book>, Rejection> {
    catalogue()
        .into_iter()
        .find(|book| book.isbn.as_deref() == Some(query.isbn.as_str()))
        .map(Json)
        .ok_or_else(|| {
            Rejection::new(
                StatusCode::NOT_FOUND,
                format!("No book found for ISBN {}", query.isbn),
                &uri,
            )
        })
}

async fn import_books(
    State(db): State<Db>,
    uri: Uri,
    mut multipart: Multipart,
) -> Result<Json<ImportReport>, Rejection> {
    let mut csv = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| Rejection::new(StatusCode::BAD_REQUEST, e.to_string(), &uri))?
    {
        if field.name() == Some("file") {
            let bytes = field
                .bytes()
                .await
                .map_err(|e| Rejection::new(StatusCode::BAD_REQUEST, e.to_string(), &uri))?;
            csv = Some(String::from_utf8_lossy(&bytes).into_owned());
        }
    }
    let csv = csv.ok_or_else(|| Rejection::new(StatusCode::BAD_REQUEST, "File is required", &uri))?;

    let mut store = db.write().await;
    let mut report = ImportReport::default();
    // Line 1 is the header: isbn,title,author,publisher,publicationDate
    for (index, line) in csv.lines().enumerate().skip(1) {
        if line.trim().is_empty() {
            continue;
        }
        let line_number = index as u32 + 1;
        match parse_row(line) {
            Ok(book) => report.books.push(upsert_by_isbn(&mut store, book)),
            Err(message) => report.errors.push(ImportError {
                line_number,
                line_content: line.to_string(),
                message: message.to_string(),
            }),
        }
    }
    tracing::info!(
        imported = report.books.len(),
        errors = report.errors.len(),
        "csv import processed"
    );
    Ok(Json(report))
}

fn parse_row(line: &str) -> Result<Book, &'static str> {
    let cols: Vec<&str> = line.split(',').map(str::trim).collect();
    let col = |i: usize| cols.get(i).copied().unwrap_or("");
    if col(0).is_empty() {
        return Err("missing isbn");
    }
    if col(1).is_empty() {
        return Err("missing title");
    }
    let publication_date = match col(4) {
        "" => None,
        raw => Some(NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| "invalid publication date")?),
    };
    let names = |raw: &str| if raw.is_empty() { Vec::new() } else { vec![Named::new(raw)] };
    Ok(Book {
        id: None,
        isbn: Some(col(0).to_string()),
        title: col(1).to_string(),
        authors: names(col(2)),
        publishers: names(col(3)),
        publication_date,
    })
}

fn upsert_by_isbn(store: &mut Store, mut book: Book) -> Book {
    let existing = store
        .books
        .iter()
        .find(|(_, stored)| stored.isbn == book.isbn)
        .map(|(id, _)| *id);
    match existing {
        Some(id) => {
            book.id = Some(id);
            store.books.insert(id, book.clone());
            book
        }
        None => store.insert(book),
    }
}
