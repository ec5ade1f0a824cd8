use thiserror::Error;

/// A failure that aborts parsing of a single input file.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("XML parsing error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("Malformed XML: {0}")]
    MalformedXml(String),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Invalid book: {0}")]
    InvalidBook(String),

    #[error("Invalid chapter number: {0}")]
    InvalidChapter(String),

    #[error("Chapter without book: {0}")]
    ChapterWithoutBook(String),

    #[error("Invalid verse reference: {0}")]
    InvalidReference(String),

    #[error("Book not found: {0}")]
    BookNotFound(String),

    #[error("Missing element: {0}")]
    MissingElement(String),

    #[error("Unsupported file type {file_type} for {metadata} metadata")]
    UnsupportedFileType { file_type: String, metadata: String },
}

pub type Result<T> = std::result::Result<T, ParseError>;

/// A failure that aborts dataset assembly as a whole.
#[derive(Error, Debug)]
pub enum DatasetError {
    #[error("Book {0} has no canonical order")]
    UnknownBookOrder(String),

    #[error("Dataset page is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}
