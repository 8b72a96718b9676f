//! Cell styles: number formats in, number formats and a bold header out
//!
//! Only the number format of a cell style is carried through the model, so
//! dates and fixed-point columns keep their display. Fonts, fills and borders
//! of the input are not preserved.

use std::collections::HashMap;
use std::io::{BufReader, Read};

use quick_xml::events::Event;
use quick_xml::reader::Reader;

use crate::error::{XlsxError, XlsxResult};
use crate::reader::attr_value;
use crate::writer::escape_xml;
use egrul_sheets_core::number_format::FIRST_CUSTOM_ID;
use egrul_sheets_core::{NumberFormat, Workbook};

/// Cell format index of the default style
pub(crate) const DEFAULT_XF: u32 = 0;

/// Cell format index of the bold header style
pub(crate) const BOLD_XF: u32 = 1;

/// Number format of every `cellXfs` entry, indexed like the cells' `s` attribute
pub(crate) fn read_cell_formats<R: Read>(reader: R) -> XlsxResult<Vec<NumberFormat>> {
    let mut xml_reader = Reader::from_reader(BufReader::new(reader));
    xml_reader.trim_text(true);

    let mut buf = Vec::new();
    let mut custom: HashMap<u32, String> = HashMap::new();
    let mut xf_ids: Vec<u32> = Vec::new();
    let mut in_cell_xfs = false;

    loop {
        match xml_reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => match e.local_name().as_ref() {
                b"numFmt" => {
                    let id = attr_value(&e, b"numFmtId").and_then(|v| v.parse().ok());
                    let code = attr_value(&e, b"formatCode");
                    if let (Some(id), Some(code)) = (id, code) {
                        custom.insert(id, code);
                    }
                }
                b"cellXfs" => in_cell_xfs = true,
                b"xf" if in_cell_xfs => {
                    let id = attr_value(&e, b"numFmtId")
                        .and_then(|v| v.parse().ok())
                        .unwrap_or(0);
                    xf_ids.push(id);
                }
                _ => {}
            },
            Ok(Event::End(e)) if e.local_name().as_ref() == b"cellXfs" => in_cell_xfs = false,
            Ok(Event::Eof) => break,
            Err(e) => return Err(XlsxError::Xml(e)),
            _ => {}
        }
        buf.clear();
    }

    Ok(xf_ids
        .into_iter()
        .map(|id| NumberFormat::from_id(id, custom.get(&id).map(String::as_str)))
        .collect())
}

/// Style table of a workbook being written
///
/// xf 0 is the default style, xf 1 the bold header; every distinct number
/// format used by the workbook gets one further xf.
#[derive(Debug, Default)]
pub(crate) struct StyleTable {
    /// (numFmtId, format) per extra xf, in xf order
    formats: Vec<(u32, NumberFormat)>,
}

impl StyleTable {
    pub(crate) fn build(workbook: &Workbook) -> Self {
        let mut table = StyleTable::default();
        let mut next_custom = FIRST_CUSTOM_ID;

        for format in workbook.worksheets().flat_map(|ws| ws.number_formats()) {
            if table.formats.iter().any(|(_, f)| f == format) {
                continue;
            }
            let id = match format {
                NumberFormat::General => continue,
                NumberFormat::BuiltIn(id) => *id,
                NumberFormat::Custom(_) => {
                    let id = next_custom;
                    next_custom += 1;
                    id
                }
            };
            table.formats.push((id, format.clone()));
        }

        table
    }

    /// xf index for a cell with this format
    pub(crate) fn xf_for(&self, format: &NumberFormat) -> u32 {
        self.formats
            .iter()
            .position(|(_, f)| f == format)
            .map_or(DEFAULT_XF, |i| i as u32 + 2)
    }

    pub(crate) fn to_styles_xml(&self) -> String {
        let mut xml = String::from(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">"#,
        );

        let custom: Vec<(u32, &str)> = self
            .formats
            .iter()
            .filter_map(|(id, f)| match f {
                NumberFormat::Custom(code) => Some((*id, code.as_str())),
                _ => None,
            })
            .collect();
        if !custom.is_empty() {
            xml.push_str(&format!("\n    <numFmts count=\"{}\">", custom.len()));
            for (id, code) in custom {
                xml.push_str(&format!(
                    "\n        <numFmt numFmtId=\"{}\" formatCode=\"{}\"/>",
                    id,
                    escape_xml(code)
                ));
            }
            xml.push_str("\n    </numFmts>");
        }

        xml.push_str(
            r#"
    <fonts count="2">
        <font><sz val="11"/><name val="Calibri"/><family val="2"/></font>
        <font><b/><sz val="11"/><name val="Calibri"/><family val="2"/></font>
    </fonts>
    <fills count="2">
        <fill><patternFill patternType="none"/></fill>
        <fill><patternFill patternType="gray125"/></fill>
    </fills>
    <borders count="1">
        <border><left/><right/><top/><bottom/><diagonal/></border>
    </borders>
    <cellStyleXfs count="1">
        <xf numFmtId="0" fontId="0" fillId="0" borderId="0"/>
    </cellStyleXfs>"#,
        );

        xml.push_str(&format!(
            r#"
    <cellXfs count="{}">
        <xf numFmtId="0" fontId="0" fillId="0" borderId="0" xfId="0"/>
        <xf numFmtId="0" fontId="1" fillId="0" borderId="0" xfId="0" applyFont="1"/>"#,
            self.formats.len() + 2
        ));
        for (id, _) in &self.formats {
            xml.push_str(&format!(
                "\n        <xf numFmtId=\"{}\" fontId=\"0\" fillId=\"0\" borderId=\"0\" xfId=\"0\" applyNumberFormat=\"1\"/>",
                id
            ));
        }

        xml.push_str(
            r#"
    </cellXfs>
    <cellStyles count="1">
        <cellStyle name="Normal" xfId="0" builtinId="0"/>
    </cellStyles>
</styleSheet>"#,
        );
        xml
    }
}
