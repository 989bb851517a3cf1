use crate::error::{IngestError, Result};
use crate::tokenizer::normalize_whitespace;
use lopdf::Document;
use std::path::Path;

#[derive(Debug, Clone)]
pub struct PageText {
    pub number: u32,
    pub text: String,
}

pub trait PdfExtractor {
    /// Reads page texts in page order, stopping after `max_pages` pages.
    fn extract_pages(&self, path: &Path, max_pages: Option<usize>) -> Result<Vec<PageText>>;
}

#[derive(Default)]
pub struct LopdfExtractor;

impl PdfExtractor for LopdfExtractor {
    fn extract_pages(&self, path: &Path, max_pages: Option<usize>) -> Result<Vec<PageText>> {
        let document = Document::load(path).map_err(|error| IngestError::PdfParse(error.to_string()))?;

        let page_numbers = document
            .get_pages()
            .into_keys()
            .take(max_pages.unwrap_or(usize::MAX))
            .collect::<Vec<_>>();

        let mut pages = Vec::new();
        for page_no in page_numbers {
            let text = document
                .extract_text(&[page_no])
                .map_err(|error| IngestError::PdfParse(error.to_string()))?;

            if !text.trim().is_empty() {
                pages.push(PageText {
                    number: page_no,
                    text,
                });
            }
        }

        Ok(pages)
    }
}

/// Checks that `path` exists and carries a `.pdf` extension.
pub fn ensure_pdf_path(path: &Path) -> Result<()> {
    if !path.exists() {
        return Err(IngestError::NotFound(path.display().to_string()));
    }

    let is_pdf = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));

    if !is_pdf {
        return Err(IngestError::UnsupportedFormat(path.display().to_string()));
    }

    Ok(())
}

/// Whitespace-normalized text of the first `max_pages` pages of a PDF.
///
/// A PDF without any readable text yields an empty string.
pub fn extract_text(path: &Path, max_pages: Option<usize>) -> Result<String> {
    extract_text_with(&LopdfExtractor, path, max_pages)
}

pub fn extract_text_with<E: PdfExtractor + ?Sized>(
    extractor: &E,
    path: &Path,
    max_pages: Option<usize>,
) -> Result<String> {
    ensure_pdf_path(path)?;

    let pages = extractor.extract_pages(path, max_pages)?;
    let raw = pages
        .into_iter()
        .map(|page| page.text)
        .collect::<Vec<_>>()
        .join("\n");

    Ok(normalize_whitespace(&raw))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    struct FixedPages(Vec<&'static str>);

    impl PdfExtractor for FixedPages {
        fn extract_pages(&self, _path: &Path, max_pages: Option<usize>) -> Result<Vec<PageText>> {
            Ok(self
                .0
                .iter()
                .take(max_pages.unwrap_or(usize::MAX))
                .enumerate()
                .filter(|(_, text)| !text.trim().is_empty())
                .map(|(index, text)| PageText {
                    number: index as u32 + 1,
                    text: text.to_string(),
                })
                .collect())
        }
    }

    #[test]
    fn missing_file_is_not_found() {
        let result = extract_text(Path::new("/definitely/not/here.pdf"), None);
        assert!(matches!(result, Err(IngestError::NotFound(_))));
    }

    #[test]
    fn non_pdf_extension_is_unsupported() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let path = dir.path().join("notes.txt");
        fs::write(&path, b"plain text")?;

        let result = extract_text(&path, None);
        assert!(matches!(result, Err(IngestError::UnsupportedFormat(_))));
        Ok(())
    }

    #[test]
    fn broken_pdf_is_a_parse_failure() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let path = dir.path().join("broken.PDF");
        fs::write(&path, b"%PDF-1.4\n%broken")?;

        let result = extract_text(&path, None);
        assert!(matches!(result, Err(IngestError::PdfParse(_))));
        Ok(())
    }

    #[test]
    fn pages_are_joined_normalized_and_capped() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let path = dir.path().join("manual.pdf");
        fs::write(&path, b"%PDF-1.4")?;

        let extractor = FixedPages(vec!["First  page\n", "   ", "Second\tpage", "Third page"]);
        assert_eq!(
            extract_text_with(&extractor, &path, None)?,
            "First page Second page Third page"
        );
        assert_eq!(
            extract_text_with(&extractor, &path, Some(2))?,
            "First page"
        );
        Ok(())
    }

    #[test]
    fn pdf_without_text_yields_empty_string() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let path = dir.path().join("scan.pdf");
        fs::write(&path, b"%PDF-1.4")?;

        let extractor = FixedPages(vec!["", "  "]);
        assert_eq!(extract_text_with(&extractor, &path, None)?, "");
        Ok(())
    }
}
