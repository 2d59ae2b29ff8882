//! Resume text extraction from an uploaded file.

use std::io::Read;
use std::path::Path;

use quick_xml::events::Event;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ResumeError {
    #[error("could not store upload: {0}")]
    Storage(#[from] std::io::Error),

    #[error("could not read {file_name}: {reason}")]
    Unreadable { file_name: String, reason: String },
}

/// Saves the upload under `upload_dir`, extracts its text and removes the temporary file.
///
/// `.pdf` uploads go through `pdf-extract`, `.docx` uploads are read paragraph by
/// paragraph from `word/document.xml`; anything else must be UTF-8 text.
pub async fn extract_resume_text(
    upload_dir: &Path,
    file_name: &str,
    bytes: Vec<u8>,
) -> Result<String, ResumeError> {
    tokio::fs::create_dir_all(upload_dir).await?;

    let upload_dir = upload_dir.to_path_buf();
    let name = file_name.to_string();

    // pdf parsing is CPU-bound and may panic on malformed input
    tokio::task::spawn_blocking(move || extract_sync(&upload_dir, &name, &bytes))
        .await
        .map_err(|e| ResumeError::Unreadable {
            file_name: file_name.to_string(),
            reason: format!("extraction aborted: {e}"),
        })?
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Format {
    Pdf,
    Docx,
    Text,
}

impl Format {
    fn of(file_name: &str) -> Self {
        let extension = Path::new(file_name)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default();
        if extension.eq_ignore_ascii_case("pdf") {
            Format::Pdf
        } else if extension.eq_ignore_ascii_case("docx") {
            Format::Docx
        } else {
            Format::Text
        }
    }

    fn suffix(self) -> &'static str {
        match self {
            Format::Pdf => ".pdf",
            Format::Docx => ".docx",
            Format::Text => ".txt",
        }
    }
}

fn extract_sync(upload_dir: &Path, file_name: &str, bytes: &[u8]) -> Result<String, ResumeError> {
    let format = Format::of(file_name);

    let mut file = tempfile::Builder::new()
        .prefix("resume-")
        .suffix(format.suffix())
        .tempfile_in(upload_dir)?;
    std::io::Write::write_all(&mut file, bytes)?;
    debug!(file_name, path = %file.path().display(), "Stored resume upload");

    let unreadable = |reason: String| ResumeError::Unreadable {
        file_name: file_name.to_string(),
        reason,
    };

    let raw = match format {
        Format::Pdf => {
            pdf_extract::extract_text(file.path()).map_err(|e| unreadable(e.to_string()))?
        }
        Format::Docx => docx_text(std::fs::File::open(file.path())?).map_err(unreadable)?,
        Format::Text => {
            let contents = std::fs::read(file.path())?;
            String::from_utf8(contents).map_err(|_| unreadable("not UTF-8 text".to_string()))?
        }
    };

    Ok(normalize(&raw))
}

/// Text of every `w:p` paragraph in the document body, one per line.
fn docx_text<R: Read + std::io::Seek>(archive: R) -> Result<String, String> {
    let mut archive =
        zip::ZipArchive::new(archive).map_err(|e| format!("not a docx archive: {e}"))?;
    let mut xml = String::new();
    archive
        .by_name("word/document.xml")
        .map_err(|e| format!("no document body: {e}"))?
        .read_to_string(&mut xml)
        .map_err(|e| format!("unreadable document body: {e}"))?;

    let mut reader = quick_xml::Reader::from_str(&xml);
    let mut paragraphs = Vec::new();
    let mut current = String::new();
    let mut in_text = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) if e.name().as_ref() == b"w:t" => in_text = true,
            Ok(Event::End(e)) if e.name().as_ref() == b"w:t" => in_text = false,
            Ok(Event::Empty(e)) if e.name().as_ref() == b"w:tab" => current.push('\t'),
            Ok(Event::Text(t)) if in_text => {
                let text = t.unescape().map_err(|e| format!("malformed document text: {e}"))?;
                current.push_str(&text);
            }
            Ok(Event::End(e)) if e.name().as_ref() == b"w:p" => {
                paragraphs.push(std::mem::take(&mut current));
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => return Err(format!("malformed document body: {e}")),
        }
    }

    Ok(paragraphs.join("\n"))
}

/// Trimmed, non-empty lines joined by newlines.
pub fn normalize(raw: &str) -> String {
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_drops_blank_lines_and_padding() {
        assert_eq!(
            normalize("  Jane Doe \n\n\tPython, PySpark\n   \nTalend  "),
            "Jane Doe\nPython, PySpark\nTalend"
        );
    }

    #[tokio::test]
    async fn test_text_upload_is_extracted_and_removed() {
        let dir = tempfile::tempdir().unwrap();
        let text = extract_resume_text(dir.path(), "resume.txt", b"Jane Doe\n\n4 years Python\n".to_vec())
            .await
            .unwrap();

        assert_eq!(text, "Jane Doe\n4 years Python");
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    fn docx(document_xml: &str) -> Vec<u8> {
        use std::io::Write;

        let mut writer = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
        let options = zip::write::FileOptions::default();
        writer.start_file("[Content_Types].xml", options).unwrap();
        writer.write_all(b"<?xml version=\"1.0\"?><Types/>").unwrap();
        writer.start_file("word/document.xml", options).unwrap();
        writer.write_all(document_xml.as_bytes()).unwrap();
        writer.finish().unwrap().into_inner()
    }

    #[tokio::test]
    async fn test_binary_upload_is_unreadable() {
        let dir = tempfile::tempdir().unwrap();
        let err = extract_resume_text(dir.path(), "resume.bin", vec![0xff, 0xfe, 0x00, 0x9f])
            .await
            .unwrap_err();
        assert!(matches!(err, ResumeError::Unreadable { ref file_name, .. } if file_name == "resume.bin"));
    }

    #[tokio::test]
    async fn test_docx_upload_yields_one_line_per_paragraph() {
        let dir = tempfile::tempdir().unwrap();
        let body = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
  <w:body>
    <w:p><w:r><w:t>Jane Doe</w:t></w:r></w:p>
    <w:p/>
    <w:p><w:r><w:t xml:space="preserve">Skills: Python, </w:t></w:r><w:r><w:t>PySpark &amp; Talend</w:t></w:r></w:p>
    <w:p><w:r><w:t>   </w:t></w:r></w:p>
    <w:p><w:r><w:t>4 years</w:t></w:r></w:p>
  </w:body>
</w:document>"#;

        let text = extract_resume_text(dir.path(), "Resume.DOCX", docx(body))
            .await
            .unwrap();

        assert_eq!(text, "Jane Doe\nSkills: Python, PySpark & Talend\n4 years");
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_docx_that_is_not_an_archive_is_unreadable() {
        let dir = tempfile::tempdir().unwrap();
        let err = extract_resume_text(dir.path(), "resume.docx", vec![0xff, 0xfe, 0x00, 0x9f])
            .await
            .unwrap_err();
        assert!(matches!(err, ResumeError::Unreadable { ref reason, .. } if reason.contains("docx")));
    }

    #[tokio::test]
    async fn test_corrupt_pdf_is_unreadable() {
        let dir = tempfile::tempdir().unwrap();
        let err = extract_resume_text(dir.path(), "Resume.PDF", b"not a pdf".to_vec())
            .await
            .unwrap_err();
        assert!(matches!(err, ResumeError::Unreadable { .. }));
    }

    #[tokio::test]
    async fn test_missing_upload_dir_is_created() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("uploads");
        extract_resume_text(&nested, "cv.md", b"# Jane".to_vec()).await.unwrap();
        assert!(nested.is_dir());
    }
}
