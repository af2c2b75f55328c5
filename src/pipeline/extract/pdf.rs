use crate::error::{PipelineError, Result};

// Readers accept a header anywhere in the first kilobyte.
const HEADER_WINDOW: usize = 1024;

fn has_pdf_header(bytes: &[u8]) -> bool {
    bytes[..bytes.len().min(HEADER_WINDOW)]
        .windows(5)
        .any(|w| w == b"%PDF-")
}

/// Extracts the text layer of a PDF held in memory. Pages come out in document order.
pub fn extract_pdf_text(bytes: &[u8]) -> Result<String> {
    if !has_pdf_header(bytes) {
        return Err(PipelineError::decode_failure("PDF", "missing %PDF- header"));
    }
    pdf_extract::extract_text_from_mem(bytes)
        .map_err(|e| PipelineError::decode_failure("PDF", e.to_string()))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Builds a one-page PDF with a Helvetica text line and a correct xref table.
    pub(crate) fn single_page_pdf(line: &str) -> Vec<u8> {
        let escaped = line
            .replace('\\', "\\\\")
            .replace('(', "\\(")
            .replace(')', "\\)");
        let content = format!("BT /F1 12 Tf 72 720 Td ({}) Tj ET", escaped);
        let objects = [
            "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
            "<< /Type /Pages /Kids [3 0 R] /Count 1 >>".to_string(),
            "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] /Contents 4 0 R /Resources << /Font << /F1 5 0 R >> >> >>".to_string(),
            format!("<< /Length {} >>\nstream\n{}\nendstream", content.len(), content),
            "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /WinAnsiEncoding >>"
                .to_string(),
        ];

        let mut out = b"%PDF-1.4\n".to_vec();
        let mut offsets = Vec::with_capacity(objects.len());
        for (i, body) in objects.iter().enumerate() {
            offsets.push(out.len());
            out.extend_from_slice(format!("{} 0 obj\n{}\nendobj\n", i + 1, body).as_bytes());
        }
        let xref_at = out.len();
        out.extend_from_slice(format!("xref\n0 {}\n", objects.len() + 1).as_bytes());
        out.extend_from_slice(b"0000000000 65535 f \n");
        for offset in offsets {
            out.extend_from_slice(format!("{:010} 00000 n \n", offset).as_bytes());
        }
        out.extend_from_slice(
            format!(
                "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
                objects.len() + 1,
                xref_at
            )
            .as_bytes(),
        );
        out
    }

    #[test]
    fn test_extracts_text_layer() {
        let bytes = single_page_pdf("Please freeze account for National ID 1234567890");
        let text = extract_pdf_text(&bytes).unwrap();
        assert!(text.contains("freeze"), "got: {:?}", text);
        assert!(text.contains("1234567890"), "got: {:?}", text);
    }

    #[test]
    fn test_header_found_within_first_kilobyte() {
        let mut bytes = b"\xEF\xBB\xBF\r\n".to_vec();
        bytes.extend_from_slice(&single_page_pdf("freeze"));
        assert!(has_pdf_header(&bytes));

        let mut late = vec![b' '; HEADER_WINDOW];
        late.extend_from_slice(b"%PDF-1.4\n");
        assert!(!has_pdf_header(&late));
        assert!(!has_pdf_header(b"%PDF"));
    }

    #[test]
    fn test_leading_bytes_pass_header_check() {
        let mut bytes = b"junk\n".to_vec();
        bytes.extend_from_slice(&single_page_pdf("Please freeze account for National ID 1234567890"));
        if let Err(e) = extract_pdf_text(&bytes) {
            assert!(!e.to_string().contains("missing %PDF- header"), "got {}", e);
        }
    }

    #[test]
    fn test_rejects_non_pdf_bytes() {
        let err = extract_pdf_text(b"hello world").unwrap_err();
        assert!(err.to_string().contains("%PDF-"));
    }
}
