//! XLSX reader

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

use crate::error::{XlsxError, XlsxResult};
use crate::styles::read_cell_formats;
use egrul_sheets_core::{
    CellAddress, CellError, CellValue, NumberFormat, SharedString, Workbook, Worksheet,
};

/// Decode Excel's `_xHHHH_` escape sequences in strings.
///
/// Excel uses this format to encode characters XML cannot carry verbatim:
/// - `_x000d_` = CR (carriage return)
/// - `_x000a_` = LF (line feed)
/// - `_x0009_` = Tab
/// - `_x005f_` = Underscore (escaped underscore)
fn decode_excel_escapes(s: &str) -> String {
    if !s.contains("_x") {
        return s.to_string();
    }

    let mut result = String::with_capacity(s.len());
    let mut rest = s;

    while let Some(pos) = rest.find("_x") {
        result.push_str(&rest[..pos]);
        let candidate = &rest[pos..];
        let decoded = candidate
            .get(2..6)
            .filter(|hex| hex.bytes().all(|b| b.is_ascii_hexdigit()))
            .filter(|_| candidate.as_bytes().get(6) == Some(&b'_'))
            .and_then(|hex| u32::from_str_radix(hex, 16).ok())
            .and_then(char::from_u32);

        match decoded {
            Some(c) => {
                result.push(c);
                rest = &candidate[7..];
            }
            None => {
                result.push_str("_x");
                rest = &candidate[2..];
            }
        }
    }

    result.push_str(rest);
    result
}

/// Read an attribute by its local name (namespace prefix ignored)
pub(crate) fn attr_value(e: &BytesStart<'_>, key: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|attr| attr.key.local_name().as_ref() == key)
        .and_then(|attr| attr.unescape_value().ok().map(|v| v.into_owned()))
}

/// Which text buffer of the pending cell receives character data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TextTarget {
    None,
    Value,
    Formula,
    Inline,
}

/// A `<c>` element being assembled
#[derive(Debug)]
struct PendingCell {
    row: u32,
    col: u16,
    cell_type: Option<String>,
    style: Option<usize>,
    value: Option<String>,
    formula: Option<String>,
    inline: Option<String>,
}

/// Workbook-level tables cells refer to by index
struct Lookups<'a> {
    shared_strings: &'a [SharedString],
    cell_formats: &'a [NumberFormat],
}

/// XLSX file reader
pub struct XlsxReader;

impl XlsxReader {
    /// Read a workbook from a file path
    pub fn read_file<P: AsRef<Path>>(path: P) -> XlsxResult<Workbook> {
        let file = File::open(path)?;
        Self::read(BufReader::new(file))
    }

    /// Read a workbook from a reader
    pub fn read<R: Read + Seek>(reader: R) -> XlsxResult<Workbook> {
        let mut archive = zip::ZipArchive::new(reader)?;

        if archive.by_name("[Content_Types].xml").is_err() {
            return Err(XlsxError::MissingPart("[Content_Types].xml".into()));
        }

        let shared_strings = Self::read_shared_strings(&mut archive)?;
        let cell_formats = Self::read_styles(&mut archive)?;
        let sheet_info = Self::read_workbook_xml(&mut archive)?;
        let sheet_paths = Self::read_workbook_rels(&mut archive)?;

        let mut workbook = Workbook::empty();

        for (name, r_id) in &sheet_info {
            let Some(path) = sheet_paths.get(r_id) else {
                log::warn!("sheet '{}' has no worksheet relationship '{}'", name, r_id);
                continue;
            };

            let mut worksheet = Worksheet::new(name.as_str());
            let lookups = Lookups {
                shared_strings: &shared_strings,
                cell_formats: &cell_formats,
            };
            Self::read_worksheet(&mut archive, path, &mut worksheet, &lookups)?;
            workbook.add_existing_worksheet(worksheet)?;
        }

        if workbook.is_empty() {
            workbook.add_worksheet_with_name("Sheet1")?;
        }

        Ok(workbook)
    }

    /// Read the shared strings table
    fn read_shared_strings<R: Read + Seek>(
        archive: &mut zip::ZipArchive<R>,
    ) -> XlsxResult<Vec<SharedString>> {
        let mut strings = Vec::new();

        let file = match archive.by_name("xl/sharedStrings.xml") {
            Ok(f) => f,
            Err(_) => return Ok(strings),
        };

        // Text is not trimmed: `xml:space="preserve"` runs carry significant spaces
        let mut xml_reader = Reader::from_reader(BufReader::new(file));

        let mut buf = Vec::new();
        let mut current = String::new();
        let mut in_si = false;
        let mut in_t = false;
        let mut in_phonetic = false;

        loop {
            match xml_reader.read_event_into(&mut buf) {
                Ok(Event::Start(e)) => match e.local_name().as_ref() {
                    b"si" => {
                        in_si = true;
                        current.clear();
                    }
                    b"rPh" => in_phonetic = true,
                    b"t" if in_si && !in_phonetic => in_t = true,
                    _ => {}
                },
                Ok(Event::Empty(e)) if e.local_name().as_ref() == b"si" => {
                    strings.push(SharedString::new(""));
                }
                Ok(Event::End(e)) => match e.local_name().as_ref() {
                    b"si" => {
                        strings.push(SharedString::new(decode_excel_escapes(&current)));
                        current.clear();
                        in_si = false;
                    }
                    b"rPh" => in_phonetic = false,
                    b"t" => in_t = false,
                    _ => {}
                },
                Ok(Event::Text(e)) if in_t => {
                    let text = e.unescape()?;
                    current.push_str(&text);
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(XlsxError::Xml(e)),
                _ => {}
            }
            buf.clear();
        }

        Ok(strings)
    }

    /// Number formats of the cell styles; a package without styles has none
    fn read_styles<R: Read + Seek>(
        archive: &mut zip::ZipArchive<R>,
    ) -> XlsxResult<Vec<NumberFormat>> {
        match archive.by_name("xl/styles.xml") {
            Ok(file) => read_cell_formats(file),
            Err(_) => Ok(Vec::new()),
        }
    }

    /// Read workbook.xml to get sheet names and rIds, in tab order
    fn read_workbook_xml<R: Read + Seek>(
        archive: &mut zip::ZipArchive<R>,
    ) -> XlsxResult<Vec<(String, String)>> {
        let file = archive
            .by_name("xl/workbook.xml")
            .map_err(|_| XlsxError::MissingPart("xl/workbook.xml".into()))?;

        let mut xml_reader = Reader::from_reader(BufReader::new(file));
        xml_reader.trim_text(true);

        let mut buf = Vec::new();
        let mut sheets = Vec::new();

        loop {
            match xml_reader.read_event_into(&mut buf) {
                Ok(Event::Empty(e)) | Ok(Event::Start(e))
                    if e.local_name().as_ref() == b"sheet" =>
                {
                    if let (Some(name), Some(r_id)) = (attr_value(&e, b"name"), attr_value(&e, b"id"))
                    {
                        sheets.push((name, r_id));
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(XlsxError::Xml(e)),
                _ => {}
            }
            buf.clear();
        }

        Ok(sheets)
    }

    /// Read workbook.xml.rels to map rIds to worksheet part paths
    fn read_workbook_rels<R: Read + Seek>(
        archive: &mut zip::ZipArchive<R>,
    ) -> XlsxResult<HashMap<String, String>> {
        let file = archive
            .by_name("xl/_rels/workbook.xml.rels")
            .map_err(|_| XlsxError::MissingPart("xl/_rels/workbook.xml.rels".into()))?;

        let mut xml_reader = Reader::from_reader(BufReader::new(file));
        xml_reader.trim_text(true);

        let mut buf = Vec::new();
        let mut rels = HashMap::new();

        loop {
            match xml_reader.read_event_into(&mut buf) {
                Ok(Event::Empty(e)) | Ok(Event::Start(e))
                    if e.local_name().as_ref() == b"Relationship" =>
                {
                    let id = attr_value(&e, b"Id");
                    let target = attr_value(&e, b"Target");
                    let rel_type = attr_value(&e, b"Type");

                    if let (Some(id), Some(target), Some(rel_type)) = (id, target, rel_type) {
                        if rel_type.ends_with("/worksheet") {
                            // Targets are relative to xl/ unless absolute
                            let full_path = match target.strip_prefix('/') {
                                Some(absolute) => absolute.to_string(),
                                None => format!("xl/{}", target),
                            };
                            rels.insert(id, full_path);
                        }
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(XlsxError::Xml(e)),
                _ => {}
            }
            buf.clear();
        }

        Ok(rels)
    }

    /// Read a worksheet part into `worksheet`
    fn read_worksheet<R: Read + Seek>(
        archive: &mut zip::ZipArchive<R>,
        path: &str,
        worksheet: &mut Worksheet,
        lookups: &Lookups<'_>,
    ) -> XlsxResult<()> {
        let file = archive
            .by_name(path)
            .map_err(|_| XlsxError::MissingPart(path.to_string()))?;

        let mut xml_reader = Reader::from_reader(BufReader::new(file));

        let mut buf = Vec::new();
        let mut current_row: Option<u32> = None;
        let mut next_col: u16 = 0;
        let mut pending: Option<PendingCell> = None;
        let mut target = TextTarget::None;
        let mut in_inline = false;
        let mut in_phonetic = false;

        loop {
            match xml_reader.read_event_into(&mut buf) {
                Ok(Event::Start(e)) => match e.local_name().as_ref() {
                    b"row" => {
                        current_row = Some(Self::row_position(&e, current_row)?);
                        next_col = 0;
                    }
                    b"c" => {
                        let addr = Self::cell_position(&e, current_row, next_col)?;
                        next_col = addr.col.saturating_add(1);
                        pending = Some(PendingCell {
                            row: addr.row,
                            col: addr.col,
                            cell_type: attr_value(&e, b"t"),
                            style: attr_value(&e, b"s").and_then(|s| s.parse().ok()),
                            value: None,
                            formula: None,
                            inline: None,
                        });
                    }
                    b"v" if pending.is_some() => target = TextTarget::Value,
                    b"f" if pending.is_some() => target = TextTarget::Formula,
                    b"is" if pending.is_some() => in_inline = true,
                    b"rPh" => in_phonetic = true,
                    b"t" if in_inline && !in_phonetic => target = TextTarget::Inline,
                    _ => {}
                },
                Ok(Event::Empty(e)) => match e.local_name().as_ref() {
                    b"row" => {
                        current_row = Some(Self::row_position(&e, current_row)?);
                        next_col = 0;
                    }
                    b"c" => {
                        // Style-only cell: occupies a position but holds no value
                        let addr = Self::cell_position(&e, current_row, next_col)?;
                        next_col = addr.col.saturating_add(1);
                    }
                    _ => {}
                },
                Ok(Event::End(e)) => match e.local_name().as_ref() {
                    b"c" => {
                        if let Some(cell) = pending.take() {
                            Self::process_cell(worksheet, cell, lookups)?;
                        }
                        in_inline = false;
                        target = TextTarget::None;
                    }
                    b"v" | b"f" | b"t" => target = TextTarget::None,
                    b"is" => in_inline = false,
                    b"rPh" => in_phonetic = false,
                    _ => {}
                },
                Ok(Event::Text(e)) if target != TextTarget::None => {
                    let text = e.unescape()?;
                    if let Some(cell) = pending.as_mut() {
                        let slot = match target {
                            TextTarget::Value => Some(&mut cell.value),
                            TextTarget::Formula => Some(&mut cell.formula),
                            TextTarget::Inline => Some(&mut cell.inline),
                            TextTarget::None => None,
                        };
                        if let Some(slot) = slot {
                            slot.get_or_insert_with(String::new).push_str(&text);
                        }
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(XlsxError::Xml(e)),
                _ => {}
            }
            buf.clear();
        }

        Ok(())
    }

    /// Row index from `r`, or the row after the previous one
    fn row_position(e: &BytesStart<'_>, previous: Option<u32>) -> XlsxResult<u32> {
        match attr_value(e, b"r") {
            Some(r) => {
                let r: u32 = r
                    .parse()
                    .map_err(|_| XlsxError::Parse(format!("Invalid row number: {}", r)))?;
                Ok(r.saturating_sub(1))
            }
            None => Ok(previous.map_or(0, |row| row + 1)),
        }
    }

    /// Cell position from `r`, or the next column of the current row
    fn cell_position(
        e: &BytesStart<'_>,
        current_row: Option<u32>,
        next_col: u16,
    ) -> XlsxResult<CellAddress> {
        match attr_value(e, b"r") {
            Some(cell_ref) => CellAddress::parse(&cell_ref).map_err(|e| {
                XlsxError::Parse(format!("Invalid cell reference '{}': {}", cell_ref, e))
            }),
            None => Ok(CellAddress::new(current_row.unwrap_or(0), next_col)),
        }
    }

    fn process_cell(
        worksheet: &mut Worksheet,
        cell: PendingCell,
        lookups: &Lookups<'_>,
    ) -> XlsxResult<()> {
        let shared_strings = lookups.shared_strings;
        let raw = cell.inline.as_deref().or(cell.value.as_deref());
        let is_inline = cell.inline.is_some();

        let value = match raw {
            Some(raw) if is_inline => Some(CellValue::string(decode_excel_escapes(raw))),
            Some(raw) => Some(Self::typed_value(cell.cell_type.as_deref(), raw, shared_strings)?),
            None => None,
        };

        let value = match cell.formula {
            Some(formula) if !formula.is_empty() => CellValue::formula(formula, value),
            _ => match value {
                Some(v) => v,
                None => return Ok(()),
            },
        };

        worksheet.set_cell_value_at(cell.row, cell.col, value)?;

        let format = cell
            .style
            .and_then(|s| lookups.cell_formats.get(s))
            .filter(|f| !f.is_general());
        if let Some(format) = format {
            worksheet.set_number_format_at(cell.row, cell.col, format.clone())?;
        }
        Ok(())
    }

    fn typed_value(
        cell_type: Option<&str>,
        raw: &str,
        shared_strings: &[SharedString],
    ) -> XlsxResult<CellValue> {
        let value = match cell_type {
            Some("s") => {
                let idx: usize = raw.trim().parse().map_err(|_| {
                    XlsxError::Parse(format!("Invalid shared string index: {}", raw))
                })?;
                let s = shared_strings.get(idx).ok_or_else(|| {
                    XlsxError::Parse(format!("Shared string index {} out of bounds", idx))
                })?;
                CellValue::String(s.clone())
            }

            Some("b") => CellValue::Boolean(raw == "1" || raw.eq_ignore_ascii_case("true")),

            Some("e") => CellError::parse(raw)
                .map(CellValue::Error)
                .unwrap_or_else(|| CellValue::string(raw)),

            Some("str") | Some("inlineStr") => CellValue::string(decode_excel_escapes(raw)),

            None | Some("n") => match raw.trim().parse::<f64>() {
                Ok(n) => CellValue::Number(n),
                Err(_) => CellValue::string(raw),
            },

            // ISO 8601 dates ("d") and anything unknown are kept as text
            Some(other) => {
                if other != "d" {
                    log::debug!("unknown cell type '{}', reading as text", other);
                }
                CellValue::string(raw)
            }
        };

        Ok(value)
    }
}
