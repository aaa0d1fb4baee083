//! Word processor extraction backed by `docx-rs`.

use super::types::{ExtractError, ExtractedDocument, FileType, file_name_of};
use docx_rs::{DocumentChild, InsertChild, Paragraph, ParagraphChild, Run, RunChild};
use std::{fs, path::Path};

/// Read a `.docx` file and join its non-blank paragraphs with newlines.
pub fn extract_docx(path: &Path) -> Result<ExtractedDocument, ExtractError> {
    let bytes = fs::read(path).map_err(|source| ExtractError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let docx = docx_rs::read_docx(&bytes).map_err(|error| ExtractError::Parse {
        path: path.to_path_buf(),
        message: error.to_string(),
    })?;

    let paragraphs: Vec<String> = docx
        .document
        .children
        .iter()
        .filter_map(|child| match child {
            DocumentChild::Paragraph(paragraph) => Some(paragraph_text(paragraph)),
            _ => None,
        })
        .filter(|text| !text.trim().is_empty())
        .collect();

    tracing::debug!(
        file = %path.display(),
        paragraphs = paragraphs.len(),
        "Extracted word processor document"
    );

    Ok(ExtractedDocument {
        file_name: file_name_of(path),
        file_type: FileType::Docx,
        text: paragraphs.join("\n"),
        sheets: Vec::new(),
    })
}

/// Concatenate the runs of a paragraph, including runs nested in hyperlinks and tracked
/// insertions; tabs and breaks keep their whitespace.
fn paragraph_text(paragraph: &Paragraph) -> String {
    let mut text = String::new();
    push_children(&paragraph.children, &mut text);
    text
}

fn push_children(children: &[ParagraphChild], text: &mut String) {
    for child in children {
        match child {
            ParagraphChild::Run(run) => push_run(run, text),
            ParagraphChild::Hyperlink(link) => push_children(&link.children, text),
            ParagraphChild::Insert(insert) => {
                for insert_child in &insert.children {
                    if let InsertChild::Run(run) = insert_child {
                        push_run(run, text);
                    }
                }
            }
            _ => {}
        }
    }
}

fn push_run(run: &Run, text: &mut String) {
    for run_child in &run.children {
        match run_child {
            RunChild::Text(value) => text.push_str(&value.text),
            RunChild::Tab(_) => text.push('\t'),
            RunChild::Break(_) => text.push('\n'),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docx_rs::{Docx, Hyperlink, HyperlinkType, Insert};
    use std::fs::File;

    fn write_docx(path: &Path, paragraphs: &[&[&str]]) {
        let mut docx = Docx::new();
        for runs in paragraphs {
            let mut paragraph = Paragraph::new();
            for run in runs.iter() {
                paragraph = paragraph.add_run(Run::new().add_text(*run));
            }
            docx = docx.add_paragraph(paragraph);
        }
        let file = File::create(path).expect("create docx");
        docx.build().pack(file).expect("pack docx");
    }

    #[test]
    fn extracts_non_blank_paragraphs_in_order() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("Customer Success Manual.docx");
        write_docx(
            &path,
            &[
                &["Reclaim ", "process"],
                &[],
                &["   "],
                &["Step 1: check the invoice"],
            ],
        );

        let document = extract_docx(&path).expect("extract");
        assert_eq!(document.file_name, "Customer Success Manual.docx");
        assert_eq!(document.file_type, FileType::Docx);
        assert_eq!(document.text, "Reclaim process\nStep 1: check the invoice");
        assert!(document.sheets.is_empty());
    }

    #[test]
    fn hyperlinks_and_insertions_keep_their_text() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("Reclaim FAQ.docx");
        let paragraph = Paragraph::new()
            .add_run(Run::new().add_text("See the "))
            .add_hyperlink(
                Hyperlink::new("reclaim-form", HyperlinkType::Anchor)
                    .add_run(Run::new().add_text("reclaim form")),
            )
            .add_run(Run::new().add_text(" for details."));
        let revised = Paragraph::new()
            .add_run(Run::new().add_text("Deadline: "))
            .add_insert(Insert::new(Run::new().add_text("14 days")));
        let file = File::create(&path).expect("create docx");
        Docx::new()
            .add_paragraph(paragraph)
            .add_paragraph(revised)
            .build()
            .pack(file)
            .expect("pack docx");

        let document = extract_docx(&path).expect("extract");
        assert_eq!(
            document.text,
            "See the reclaim form for details.\nDeadline: 14 days"
        );
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let error = extract_docx(Path::new("does/not/exist.docx")).unwrap_err();
        assert!(matches!(error, ExtractError::Read { .. }));
    }

    #[test]
    fn garbage_bytes_are_a_parse_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("broken.docx");
        fs::write(&path, b"definitely not a zip archive").expect("write");
        let error = extract_docx(&path).unwrap_err();
        assert!(matches!(error, ExtractError::Parse { .. }));
    }
}
