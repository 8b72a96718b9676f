//! XLSX writer

use std::fs::File;
use std::io::{BufWriter, Seek, Write};
use std::path::Path;

use crate::error::XlsxResult;
use crate::styles::{StyleTable, BOLD_XF, DEFAULT_XF};
use egrul_sheets_core::{CellAddress, CellValue, Workbook, Worksheet};

/// Options controlling how a workbook is serialised
#[derive(Debug, Clone, Default)]
pub struct WriteOptions {
    /// Render the first row of every sheet in bold
    pub bold_header: bool,
}

impl WriteOptions {
    /// Options with a bold header row
    pub fn with_bold_header() -> Self {
        Self { bold_header: true }
    }
}

/// XLSX file writer
pub struct XlsxWriter;

impl XlsxWriter {
    /// Write a workbook to a file path
    pub fn write_file<P: AsRef<Path>>(workbook: &Workbook, path: P) -> XlsxResult<()> {
        Self::write_file_with_options(workbook, path, &WriteOptions::default())
    }

    /// Write a workbook to a file path with explicit options
    pub fn write_file_with_options<P: AsRef<Path>>(
        workbook: &Workbook,
        path: P,
        options: &WriteOptions,
    ) -> XlsxResult<()> {
        let file = File::create(path)?;
        Self::write_with_options(workbook, BufWriter::new(file), options)
    }

    /// Write a workbook to a writer
    pub fn write<W: Write + Seek>(workbook: &Workbook, writer: W) -> XlsxResult<()> {
        Self::write_with_options(workbook, writer, &WriteOptions::default())
    }

    /// Write a workbook to a writer with explicit options
    pub fn write_with_options<W: Write + Seek>(
        workbook: &Workbook,
        writer: W,
        options: &WriteOptions,
    ) -> XlsxResult<()> {
        let mut zip = zip::ZipWriter::new(writer);

        Self::write_part(&mut zip, "[Content_Types].xml", &Self::content_types(workbook))?;
        Self::write_part(&mut zip, "_rels/.rels", ROOT_RELS)?;
        Self::write_part(&mut zip, "xl/workbook.xml", &Self::workbook_xml(workbook))?;
        Self::write_part(
            &mut zip,
            "xl/_rels/workbook.xml.rels",
            &Self::workbook_rels(workbook),
        )?;
        let styles = StyleTable::build(workbook);
        Self::write_part(&mut zip, "xl/styles.xml", &styles.to_styles_xml())?;

        for (i, sheet) in workbook.worksheets().enumerate() {
            let part = format!("xl/worksheets/sheet{}.xml", i + 1);
            let xml = Self::worksheet_xml(sheet, &styles, options);
            Self::write_part(&mut zip, &part, &xml)?;
        }

        let mut inner = zip.finish()?;
        inner.flush()?;
        Ok(())
    }

    fn write_part<W: Write + Seek>(
        zip: &mut zip::ZipWriter<W>,
        name: &str,
        content: &str,
    ) -> XlsxResult<()> {
        let options = zip::write::SimpleFileOptions::default();
        zip.start_file(name, options)?;
        zip.write_all(content.as_bytes())?;
        Ok(())
    }

    fn content_types(workbook: &Workbook) -> String {
        let mut content = String::from(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
    <Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
    <Default Extension="xml" ContentType="application/xml"/>
    <Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>
    <Override PartName="/xl/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml"/>"#,
        );

        for i in 0..workbook.sheet_count() {
            content.push_str(&format!(
                r#"
    <Override PartName="/xl/worksheets/sheet{}.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>"#,
                i + 1
            ));
        }

        content.push_str("\n</Types>");
        content
    }

    fn workbook_xml(workbook: &Workbook) -> String {
        let mut content = String::from(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
    <sheets>"#,
        );

        for (i, sheet) in workbook.worksheets().enumerate() {
            content.push_str(&format!(
                r#"
        <sheet name="{}" sheetId="{}" r:id="rId{}"/>"#,
                escape_xml(sheet.name()),
                i + 1,
                i + 1
            ));
        }

        content.push_str(
            r#"
    </sheets>
</workbook>"#,
        );
        content
    }

    fn workbook_rels(workbook: &Workbook) -> String {
        let mut content = String::from(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
        );

        for i in 0..workbook.sheet_count() {
            content.push_str(&format!(
                r#"
    <Relationship Id="rId{}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet{}.xml"/>"#,
                i + 1,
                i + 1
            ));
        }

        content.push_str(&format!(
            r#"
    <Relationship Id="rId{}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/>
</Relationships>"#,
            workbook.sheet_count() + 1
        ));
        content
    }

    fn worksheet_xml(sheet: &Worksheet, styles: &StyleTable, options: &WriteOptions) -> String {
        let mut content = String::from(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">"#,
        );

        let dimension = sheet
            .used_range()
            .map_or_else(|| "A1".to_string(), |range| range.to_a1_string());
        content.push_str(&format!("\n    <dimension ref=\"{}\"/>", dimension));
        content.push_str("\n    <sheetData>");

        let mut current_row: Option<u32> = None;
        for (row, col, value) in sheet.iter_cells() {
            if current_row != Some(row) {
                if current_row.is_some() {
                    content.push_str("\n        </row>");
                }
                content.push_str(&format!("\n        <row r=\"{}\">", row + 1));
                current_row = Some(row);
            }

            let style = if options.bold_header && row == 0 {
                BOLD_XF
            } else {
                styles.xf_for(sheet.number_format_at(row, col))
            };
            let style = Some(style).filter(|&xf| xf != DEFAULT_XF);
            Self::write_cell(&mut content, CellAddress::new(row, col), value, style);
        }

        if current_row.is_some() {
            content.push_str("\n        </row>");
        }

        content.push_str("\n    </sheetData>\n</worksheet>");
        content
    }

    fn write_cell(content: &mut String, addr: CellAddress, value: &CellValue, style: Option<u32>) {
        let style_attr = style.map_or_else(String::new, |s| format!(" s=\"{}\"", s));

        match value {
            CellValue::Empty => {}
            CellValue::Number(n) if n.is_finite() => {
                content.push_str(&format!(
                    "\n            <c r=\"{}\"{}><v>{}</v></c>",
                    addr, style_attr, n
                ));
            }
            CellValue::Number(_) => {
                content.push_str(&format!(
                    "\n            <c r=\"{}\"{} t=\"e\"><v>#NUM!</v></c>",
                    addr, style_attr
                ));
            }
            CellValue::String(s) => {
                content.push_str(&format!(
                    "\n            <c r=\"{}\"{} t=\"inlineStr\"><is><t xml:space=\"preserve\">{}</t></is></c>",
                    addr,
                    style_attr,
                    escape_xml(&encode_excel_escapes(s.as_str()))
                ));
            }
            CellValue::Boolean(b) => {
                content.push_str(&format!(
                    "\n            <c r=\"{}\"{} t=\"b\"><v>{}</v></c>",
                    addr,
                    style_attr,
                    u8::from(*b)
                ));
            }
            CellValue::Error(e) => {
                content.push_str(&format!(
                    "\n            <c r=\"{}\"{} t=\"e\"><v>{}</v></c>",
                    addr,
                    style_attr,
                    escape_xml(e.as_str())
                ));
            }
            CellValue::Formula { text, cached_value } => {
                let formula = escape_xml(text.strip_prefix('=').unwrap_or(text));
                let (type_attr, cached) = match cached_value.as_deref() {
                    Some(CellValue::Number(n)) if n.is_finite() => ("", n.to_string()),
                    Some(CellValue::String(s)) => {
                        (" t=\"str\"", escape_xml(&encode_excel_escapes(s.as_str())))
                    }
                    Some(CellValue::Boolean(b)) => (" t=\"b\"", u8::from(*b).to_string()),
                    Some(CellValue::Error(e)) => (" t=\"e\"", e.as_str().to_string()),
                    _ => ("", String::new()),
                };
                let cached = if cached.is_empty() {
                    String::new()
                } else {
                    format!("<v>{}</v>", cached)
                };
                content.push_str(&format!(
                    "\n            <c r=\"{}\"{}{}><f>{}</f>{}</c>",
                    addr, style_attr, type_attr, formula, cached
                ));
            }
        }
    }
}

/// Encode characters XML 1.0 cannot carry as `_xHHHH_`
///
/// An underscore that would otherwise start an escape is itself written as
/// `_x005F_`, so literal `_xHHHH_` text reads back unchanged.
fn encode_excel_escapes(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for (i, c) in s.char_indices() {
        match c {
            '\t' | '\n' | '\r' => result.push(c),
            '\u{0}'..='\u{1f}' | '\u{fffe}' | '\u{ffff}' => {
                result.push_str(&format!("_x{:04X}_", c as u32));
            }
            '_' if starts_escape(&s[i..]) => result.push_str("_x005F_"),
            _ => result.push(c),
        }
    }
    result
}

fn starts_escape(s: &str) -> bool {
    let bytes = s.as_bytes();
    bytes.len() >= 7
        && bytes[1] == b'x'
        && bytes[2..6].iter().all(u8::is_ascii_hexdigit)
        && bytes[6] == b'_'
}

pub(crate) fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

const ROOT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
    <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/>
</Relationships>"#;
