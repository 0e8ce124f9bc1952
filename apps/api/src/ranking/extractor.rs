//! Document text extraction — converts an uploaded PDF or DOCX resume into
//! plain text and picks out a best-effort contact email.
//!
//! Extraction never fails the batch: corrupt files, unreadable archives and
//! unknown extensions all degrade to empty text plus a sentinel email. The
//! routing decision is made on the filename suffix, not the declared MIME
//! type, to tolerate mislabeled uploads.
//!
//! Parsing binary documents is CPU-bound, so the body runs inside
//! `tokio::task::spawn_blocking` to keep the scheduler unblocked.

use std::io::{Cursor, Read};
use std::sync::OnceLock;

use regex::Regex;
use tracing::{debug, warn};

use crate::ranking::models::{
    ExtractedDocument, UploadedResume, EMAIL_NOT_FOUND, UNSUPPORTED_FILE_TYPE,
};

/// Extracts text and a contact email from one uploaded resume.
pub async fn extract(file: &UploadedResume) -> ExtractedDocument {
    if let Some(content_type) = &file.content_type {
        debug!("extracting '{}' (declared type: {content_type})", file.file_name);
    }

    let file_name = file.file_name.clone();
    let content = file.content.clone();
    let task_name = file_name.clone();

    tokio::task::spawn_blocking(move || extract_sync(&task_name, &content))
        .await
        .unwrap_or_else(|e| {
            warn!("extraction task for '{file_name}' failed: {e}");
            ExtractedDocument {
                file_name,
                text: String::new(),
                email: EMAIL_NOT_FOUND.to_string(),
            }
        })
}

fn extract_sync(file_name: &str, content: &[u8]) -> ExtractedDocument {
    let lower = file_name.to_lowercase();

    let text = if lower.ends_with(".pdf") {
        extract_pdf(content, file_name)
    } else if lower.ends_with(".docx") {
        extract_docx(content, file_name)
    } else {
        return ExtractedDocument {
            file_name: file_name.to_string(),
            text: String::new(),
            email: UNSUPPORTED_FILE_TYPE.to_string(),
        };
    };

    let email = detect_email(&text);
    ExtractedDocument {
        file_name: file_name.to_string(),
        text,
        email,
    }
}

fn extract_pdf(content: &[u8], file_name: &str) -> String {
    match pdf_extract::extract_text_from_mem(content) {
        Ok(text) => text,
        Err(e) => {
            warn!("failed to extract text from PDF '{file_name}': {e}");
            String::new()
        }
    }
}

fn extract_docx(content: &[u8], file_name: &str) -> String {
    match read_docx_document_xml(content) {
        Ok(xml) => docx_xml_to_text(&xml),
        Err(e) => {
            warn!("failed to read '{file_name}' as DOCX: {e}");
            String::new()
        }
    }
}

/// Pulls `word/document.xml` out of the DOCX container.
fn read_docx_document_xml(content: &[u8]) -> anyhow::Result<String> {
    let mut archive = zip::ZipArchive::new(Cursor::new(content))?;
    let mut entry = archive.by_name("word/document.xml")?;
    let mut xml = String::new();
    entry.read_to_string(&mut xml)?;
    Ok(xml)
}

/// Flattens WordprocessingML into plain text: paragraph ends become
/// newlines, every remaining tag is stripped, basic entities are decoded.
fn docx_xml_to_text(xml: &str) -> String {
    let with_breaks = xml.replace("</w:p>", "\n").replace("<w:tab/>", "\t");
    let stripped = tag_regex().replace_all(&with_breaks, "");
    let decoded = stripped
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&");

    decoded
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Scans extracted text for the first email-shaped token.
/// Returns the not-found sentinel when there is none.
pub fn detect_email(text: &str) -> String {
    email_regex()
        .find(text)
        .map(|m| m.as_str().to_string())
        .unwrap_or_else(|| EMAIL_NOT_FOUND.to_string())
}

fn email_regex() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| {
        Regex::new(r"(?i)[a-z0-9._%+-]+@[a-z0-9-]+(\.[a-z0-9-]+)*\.[a-z]{2,}")
            .expect("email pattern compiles")
    })
}

fn tag_regex() -> &'static Regex {
    static TAG: OnceLock<Regex> = OnceLock::new();
    TAG.get_or_init(|| Regex::new(r"<[^>]*>").expect("tag pattern compiles"))
}

/// Builds a minimal in-memory DOCX (a zip carrying word/document.xml).
/// Shared fixture for extractor and orchestrator tests.
#[cfg(test)]
pub(crate) fn docx_fixture(paragraphs: &[&str]) -> Vec<u8> {
    use std::io::Write;

    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    writer
        .start_file("word/document.xml", zip::write::FileOptions::default())
        .unwrap();
    let body: String = paragraphs
        .iter()
        .map(|p| format!("<w:p><w:r><w:t>{p}</w:t></w:r></w:p>"))
        .collect();
    write!(
        writer,
        "<?xml version=\"1.0\"?><w:document><w:body>{body}</w:body></w:document>"
    )
    .unwrap();
    writer.finish().unwrap().into_inner()
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    fn upload(file_name: &str, content: Vec<u8>) -> UploadedResume {
        UploadedResume {
            file_name: file_name.to_string(),
            content_type: None,
            content: Bytes::from(content),
        }
    }

    #[tokio::test]
    async fn test_unknown_extension_returns_sentinel_without_parsing() {
        let doc = extract(&upload("resume.txt", b"plain text body".to_vec())).await;
        assert_eq!(doc.email, UNSUPPORTED_FILE_TYPE);
        assert!(doc.text.is_empty());
        assert_eq!(doc.file_name, "resume.txt");
    }

    #[tokio::test]
    async fn test_corrupt_pdf_degrades_to_empty_text() {
        let doc = extract(&upload("broken.pdf", b"definitely not a pdf".to_vec())).await;
        assert!(doc.text.is_empty());
        assert_eq!(doc.email, EMAIL_NOT_FOUND);
    }

    #[tokio::test]
    async fn test_docx_extraction_finds_text_and_email() {
        let content = docx_fixture(&["Alice Example", "Contact: alice@x.com", "Rust, Go"]);
        let doc = extract(&upload("alice.docx", content)).await;
        assert!(doc.text.contains("Alice Example"));
        assert!(doc.text.contains("Rust, Go"));
        assert_eq!(doc.email, "alice@x.com");
    }

    #[tokio::test]
    async fn test_suffix_routing_is_case_insensitive() {
        let content = docx_fixture(&["Bob Builder"]);
        let doc = extract(&upload("BOB.DOCX", content)).await;
        assert!(doc.text.contains("Bob Builder"));
        assert_eq!(doc.email, EMAIL_NOT_FOUND);
    }

    #[tokio::test]
    async fn test_corrupt_docx_degrades_to_empty_text() {
        let doc = extract(&upload("broken.docx", b"not a zip archive".to_vec())).await;
        assert!(doc.text.is_empty());
        assert_eq!(doc.email, EMAIL_NOT_FOUND);
    }

    #[test]
    fn test_detect_email_returns_first_match() {
        let text = "Reach me at first@example.com or second@example.org";
        assert_eq!(detect_email(text), "first@example.com");
    }

    #[test]
    fn test_detect_email_requires_dotted_domain() {
        assert_eq!(detect_email("not-an-email@localhost"), EMAIL_NOT_FOUND);
        assert_eq!(detect_email("no address here"), EMAIL_NOT_FOUND);
    }

    #[test]
    fn test_docx_xml_to_text_strips_tags_and_decodes_entities() {
        let xml = "<w:p><w:r><w:t>Systems &amp; Tools</w:t></w:r></w:p><w:p><w:r><w:t>Line two</w:t></w:r></w:p>";
        assert_eq!(docx_xml_to_text(xml), "Systems & Tools\nLine two");
    }
}
