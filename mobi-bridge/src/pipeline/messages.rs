//! User-facing chat texts.

/// Reply to `/start`.
pub const GREETING: &str =
    "Hi! Send me a book in FB2 or TXT format and I will convert it to MOBI.";

/// Reply to a document with an unsupported extension.
pub const UNSUPPORTED_FORMAT: &str = "Please send a file in FB2 or TXT format.";

/// Acknowledgement sent before a job starts downloading.
pub const CONVERSION_STARTED: &str = "Starting conversion...";

/// Generic failure notice; details only go to the operator log.
pub const PROCESSING_FAILED: &str =
    "An error occurred while processing the file. Please try again.";

/// Caption attached to the converted document.
pub const UPLOAD_CAPTION: &str = "Here is your book in MOBI format";

/// Success notice carrying the retrieval link.
pub fn conversion_completed(url: &str) -> String {
    format!("Conversion finished. You can download the file here:\n{url}")
}
