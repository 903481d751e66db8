use std::borrow::Cow;
use std::io::{BufWriter, Cursor, Write};

use chrono::{Local, Timelike};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use printpdf::{BuiltinFont, IndirectFontRef, Mm, PdfDocument, PdfLayerReference};
use rust_xlsxwriter::{Color, Format, FormatAlign, FormatBorder, Workbook};
use zip::write::FileOptions;
use zip::ZipWriter;

use crate::dto::export_dto::ExportFormat;
use crate::error::{Error, Result};
use crate::models::appointment::Appointment;
use crate::models::vehicle::{Vehicle, VehicleTypeWithCount};
use crate::utils::time_slot::twelve_hour_label;

/// A titled grid of text cells, the common input of every export format.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportTable {
    pub title: String,
    pub columns: Vec<(&'static str, f64)>,
    pub rows: Vec<Vec<String>>,
}

impl ExportTable {
    pub fn vehicle_types(items: &[VehicleTypeWithCount]) -> Self {
        let rows = items
            .iter()
            .map(|t| {
                vec![
                    t.id.to_string(),
                    t.name.clone(),
                    t.brand.clone().unwrap_or_default(),
                    t.image.clone().unwrap_or_default(),
                    t.vehicle_count.to_string(),
                ]
            })
            .collect();
        Self {
            title: "Vehicle types".to_string(),
            columns: vec![
                ("ID", 8.0),
                ("Tên Loại", 28.0),
                ("Nhãn Hiệu", 22.0),
                ("Hình Ảnh", 40.0),
                ("Số Xe", 10.0),
            ],
            rows,
        }
    }

    pub fn vehicles(items: &[Vehicle]) -> Self {
        let rows = items
            .iter()
            .map(|v| {
                vec![
                    v.id.to_string(),
                    v.name.clone(),
                    v.price.map(|p| p.to_string()).unwrap_or_default(),
                    v.vehicle_type_id.map(|id| id.to_string()).unwrap_or_default(),
                    v.image.clone().unwrap_or_default(),
                ]
            })
            .collect();
        Self {
            title: "Vehicles".to_string(),
            columns: vec![
                ("ID", 8.0),
                ("Tên Xe", 30.0),
                ("Giá Xe", 18.0),
                ("Loại Xe", 10.0),
                ("Hình Ảnh", 40.0),
            ],
            rows,
        }
    }

    pub fn appointments(items: &[Appointment]) -> Self {
        let rows = items
            .iter()
            .map(|a| {
                let date = a.appointment_date.with_timezone(&Local).format("%d/%m/%Y").to_string();
                let local_time = a.appointment_time.with_timezone(&Local);
                let time = twelve_hour_label(local_time.hour(), local_time.minute());
                vec![
                    a.id.to_string(),
                    a.customer_name.clone(),
                    a.phone.clone(),
                    a.email.clone(),
                    a.vehicle_id.to_string(),
                    date,
                    time,
                    a.location.clone(),
                    a.status.to_string(),
                ]
            })
            .collect();
        Self {
            title: "Test drive appointments".to_string(),
            columns: vec![
                ("ID", 8.0),
                ("Khách Hàng", 26.0),
                ("Số Điện Thoại", 16.0),
                ("Email", 28.0),
                ("Xe", 8.0),
                ("Ngày Hẹn", 14.0),
                ("Giờ Hẹn", 12.0),
                ("Địa Điểm", 45.0),
                ("Trạng Thái", 14.0),
            ],
            rows,
        }
    }
}

pub struct ExportService;

impl ExportService {
    pub fn render(table: &ExportTable, format: ExportFormat) -> Result<Vec<u8>> {
        match format {
            ExportFormat::Excel => Self::to_xlsx(table),
            ExportFormat::Pdf => Self::to_pdf(table),
            ExportFormat::Word => Self::to_docx(table),
        }
    }

    pub fn file_name(stem: &str, format: ExportFormat) -> String {
        format!("{}_{}.{}", stem, Local::now().format("%Y%m%d_%H%M"), format.extension())
    }

    pub fn to_xlsx(table: &ExportTable) -> Result<Vec<u8>> {
        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();
        worksheet.set_name("Export")?;

        let primary_color = Color::RGB(0x1E293B);
        let header_bg = Color::RGB(0x0F172A);
        let alt_row = Color::RGB(0xF8FAFC);
        let border_color = Color::RGB(0xE2E8F0);
        let last_col = (table.columns.len().max(1) - 1) as u16;

        for (i, (_, width)) in table.columns.iter().enumerate() {
            worksheet.set_column_width(i as u16, *width)?;
        }

        let title_format = Format::new()
            .set_font_size(16)
            .set_bold()
            .set_font_color(Color::White)
            .set_background_color(primary_color)
            .set_align(FormatAlign::CenterAcross)
            .set_align(FormatAlign::VerticalCenter);
        worksheet.set_row_height(0, 36)?;
        if last_col == 0 {
            worksheet.write_string_with_format(0, 0, &table.title, &title_format)?;
        } else {
            worksheet.merge_range(0, 0, 0, last_col, &table.title, &title_format)?;
        }

        let header_format = Format::new()
            .set_bold()
            .set_font_size(10)
            .set_font_color(Color::White)
            .set_background_color(header_bg)
            .set_align(FormatAlign::Center)
            .set_align(FormatAlign::VerticalCenter)
            .set_text_wrap()
            .set_border(FormatBorder::Thin)
            .set_border_color(border_color);
        let header_row = 1;
        worksheet.set_row_height(header_row, 26)?;
        for (i, (name, _)) in table.columns.iter().enumerate() {
            worksheet.write_string_with_format(header_row, i as u16, *name, &header_format)?;
        }

        let data_start_row = header_row + 1;
        for (idx, cells) in table.rows.iter().enumerate() {
            let row = data_start_row + idx as u32;
            let bg = if idx % 2 == 0 { alt_row } else { Color::White };
            let cell_format = Format::new()
                .set_font_size(10)
                .set_background_color(bg)
                .set_align(FormatAlign::VerticalCenter)
                .set_border(FormatBorder::Thin)
                .set_border_color(border_color);
            for (col, value) in cells.iter().enumerate() {
                worksheet.write_string_with_format(row, col as u16, value, &cell_format)?;
            }
        }

        worksheet.set_freeze_panes(data_start_row, 0)?;
        let last_row = (data_start_row + table.rows.len() as u32).saturating_sub(1).max(header_row);
        worksheet.autofilter(header_row, 0, last_row, last_col)?;

        Ok(workbook.save_to_buffer()?)
    }

    pub fn to_pdf(table: &ExportTable) -> Result<Vec<u8>> {
        const PAGE_W: f32 = 297.0;
        const PAGE_H: f32 = 210.0;
        const MARGIN: f32 = 12.0;
        const LINE: f32 = 6.0;

        let (doc, page1, layer1) = PdfDocument::new(&table.title, Mm(PAGE_W), Mm(PAGE_H), "Layer 1");
        let font = doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(|e| Error::Pdf(format!("font: {}", e)))?;
        let bold = doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(|e| Error::Pdf(format!("font: {}", e)))?;

        let offsets = column_offsets(&table.columns, PAGE_W - 2.0 * MARGIN);
        let mut layer = doc.get_page(page1).get_layer(layer1);
        let mut y = PAGE_H - MARGIN;

        layer.use_text(&table.title, 14.0, Mm(MARGIN), Mm(y), &bold);
        y -= LINE * 1.5;
        write_pdf_row(&layer, &bold, &offsets, table.columns.iter().map(|(h, _)| *h), MARGIN, y);
        y -= LINE;

        for cells in &table.rows {
            if y < MARGIN {
                let (page, page_layer) = doc.add_page(Mm(PAGE_W), Mm(PAGE_H), "Layer 1");
                layer = doc.get_page(page).get_layer(page_layer);
                y = PAGE_H - MARGIN;
                write_pdf_row(&layer, &bold, &offsets, table.columns.iter().map(|(h, _)| *h), MARGIN, y);
                y -= LINE;
            }
            write_pdf_row(&layer, &font, &offsets, cells.iter().map(String::as_str), MARGIN, y);
            y -= LINE;
        }

        let mut buf = BufWriter::new(Vec::new());
        doc.save(&mut buf).map_err(|e| Error::Pdf(format!("save: {}", e)))?;
        buf.into_inner()
            .map_err(|e| Error::Pdf(format!("buffer: {}", e)))
    }

    pub fn to_docx(table: &ExportTable) -> Result<Vec<u8>> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options = FileOptions::default();

        zip.start_file("[Content_Types].xml", options)?;
        zip.write_all(CONTENT_TYPES_XML.as_bytes())?;
        zip.start_file("_rels/.rels", options)?;
        zip.write_all(RELS_XML.as_bytes())?;
        zip.start_file("word/document.xml", options)?;
        zip.write_all(&document_xml(table)?)?;

        let cursor = zip.finish()?;
        Ok(cursor.into_inner())
    }
}

/// Left edge of each column, proportional to its spreadsheet width.
fn column_offsets(columns: &[(&'static str, f64)], usable: f32) -> Vec<f32> {
    let total: f64 = columns.iter().map(|(_, w)| *w).sum();
    if total <= 0.0 {
        return vec![0.0; columns.len()];
    }
    let mut acc = 0.0_f32;
    columns
        .iter()
        .map(|(_, w)| {
            let at = acc;
            acc += (w / total) as f32 * usable;
            at
        })
        .collect()
}

fn write_pdf_row<'a>(
    layer: &PdfLayerReference,
    font: &IndirectFontRef,
    offsets: &[f32],
    cells: impl Iterator<Item = &'a str>,
    margin: f32,
    y: f32,
) {
    let widths: Vec<f32> = offsets
        .windows(2)
        .map(|pair| pair[1] - pair[0])
        .chain(std::iter::once(f32::MAX))
        .collect();
    for ((cell, x), width) in cells.zip(offsets).zip(widths) {
        // Roughly 2mm per character at 8pt.
        let max_chars = ((width / 2.0) as usize).max(3);
        let text = truncate(cell, max_chars);
        layer.use_text(text, 8.0, Mm(margin + x), Mm(y), font);
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let mut out: String = text.chars().take(max_chars.saturating_sub(1)).collect();
        out.push('…');
        out
    }
}

const CONTENT_TYPES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
<Default Extension="xml" ContentType="application/xml"/>
<Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/>
</Types>"#;

const RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/>
</Relationships>"#;

const WORD_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";

type XmlWriter = Writer<Cursor<Vec<u8>>>;

fn open(writer: &mut XmlWriter, name: &str, attrs: &[(&str, &str)]) -> Result<()> {
    let mut tag = BytesStart::new(name);
    for attr in attrs {
        tag.push_attribute(*attr);
    }
    writer.write_event(Event::Start(tag))?;
    Ok(())
}

fn close(writer: &mut XmlWriter, name: &str) -> Result<()> {
    writer.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}

fn empty(writer: &mut XmlWriter, name: &str, attrs: &[(&str, &str)]) -> Result<()> {
    let mut tag = BytesStart::new(name);
    for attr in attrs {
        tag.push_attribute(*attr);
    }
    writer.write_event(Event::Empty(tag))?;
    Ok(())
}

/// Drops characters XML 1.0 does not allow in text content.
fn xml_safe(text: &str) -> Cow<'_, str> {
    let allowed = |c: char| {
        matches!(c, '\t' | '\n' | '\r') || (c >= '\u{20}' && !matches!(c, '\u{FFFE}' | '\u{FFFF}'))
    };
    if text.chars().all(allowed) {
        Cow::Borrowed(text)
    } else {
        Cow::Owned(text.chars().filter(|c| allowed(*c)).collect())
    }
}

fn write_run(writer: &mut XmlWriter, text: &str, bold: bool, size: Option<&str>) -> Result<()> {
    open(writer, "w:r", &[])?;
    if bold || size.is_some() {
        open(writer, "w:rPr", &[])?;
        if bold {
            empty(writer, "w:b", &[])?;
        }
        if let Some(size) = size {
            empty(writer, "w:sz", &[("w:val", size)])?;
        }
        close(writer, "w:rPr")?;
    }
    open(writer, "w:t", &[("xml:space", "preserve")])?;
    writer.write_event(Event::Text(BytesText::new(&xml_safe(text))))?;
    close(writer, "w:t")?;
    close(writer, "w:r")
}

fn write_cell(writer: &mut XmlWriter, text: &str, bold: bool) -> Result<()> {
    open(writer, "w:tc", &[])?;
    open(writer, "w:p", &[])?;
    write_run(writer, text, bold, None)?;
    close(writer, "w:p")?;
    close(writer, "w:tc")
}

fn document_xml(table: &ExportTable) -> Result<Vec<u8>> {
    let mut writer = Writer::new(Cursor::new(Vec::new()));
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))?;
    open(&mut writer, "w:document", &[("xmlns:w", WORD_NS)])?;
    open(&mut writer, "w:body", &[])?;

    open(&mut writer, "w:p", &[])?;
    open(&mut writer, "w:pPr", &[])?;
    empty(&mut writer, "w:jc", &[("w:val", "center")])?;
    close(&mut writer, "w:pPr")?;
    write_run(&mut writer, &table.title, true, Some("32"))?;
    close(&mut writer, "w:p")?;

    open(&mut writer, "w:tbl", &[])?;
    open(&mut writer, "w:tblPr", &[])?;
    empty(&mut writer, "w:tblStyle", &[("w:val", "TableGrid")])?;
    empty(&mut writer, "w:tblW", &[("w:w", "0"), ("w:type", "auto")])?;
    open(&mut writer, "w:tblBorders", &[])?;
    for edge in ["w:top", "w:left", "w:bottom", "w:right", "w:insideH", "w:insideV"] {
        empty(
            &mut writer,
            edge,
            &[("w:val", "single"), ("w:sz", "4"), ("w:space", "0"), ("w:color", "auto")],
        )?;
    }
    close(&mut writer, "w:tblBorders")?;
    close(&mut writer, "w:tblPr")?;

    open(&mut writer, "w:tr", &[])?;
    for (header, _) in &table.columns {
        write_cell(&mut writer, header, true)?;
    }
    close(&mut writer, "w:tr")?;
    for cells in &table.rows {
        open(&mut writer, "w:tr", &[])?;
        for cell in cells {
            write_cell(&mut writer, cell, false)?;
        }
        close(&mut writer, "w:tr")?;
    }
    close(&mut writer, "w:tbl")?;

    open(&mut writer, "w:sectPr", &[])?;
    empty(
        &mut writer,
        "w:pgSz",
        &[("w:w", "16838"), ("w:h", "11906"), ("w:orient", "landscape")],
    )?;
    close(&mut writer, "w:sectPr")?;
    close(&mut writer, "w:body")?;
    close(&mut writer, "w:document")?;

    Ok(writer.into_inner().into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    fn sample() -> ExportTable {
        ExportTable::vehicle_types(&[
            VehicleTypeWithCount {
                id: 1,
                name: "SUV".into(),
                brand: Some("Toyota & Co".into()),
                image: None,
                vehicle_count: 4,
            },
            VehicleTypeWithCount {
                id: 2,
                name: "Sedan".into(),
                brand: None,
                image: Some("sedan.png".into()),
                vehicle_count: 0,
            },
        ])
    }

    fn empty() -> ExportTable {
        ExportTable::vehicle_types(&[])
    }

    #[test]
    fn xlsx_is_a_zip_container() {
        for table in [sample(), empty()] {
            let bytes = ExportService::render(&table, ExportFormat::Excel).unwrap();
            assert_eq!(&bytes[..2], b"PK");
        }
    }

    #[test]
    fn pdf_has_magic_header() {
        for table in [sample(), empty()] {
            let bytes = ExportService::render(&table, ExportFormat::Pdf).unwrap();
            assert!(bytes.starts_with(b"%PDF"));
        }
    }

    #[test]
    fn long_tables_spill_onto_more_pages() {
        let mut table = sample();
        table.rows = (0..120).map(|i| vec![i.to_string(); 5]).collect();
        let bytes = ExportService::to_pdf(&table).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn docx_contains_escaped_rows() {
        let bytes = ExportService::render(&sample(), ExportFormat::Word).unwrap();
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        assert!(archive.by_name("[Content_Types].xml").is_ok());

        let mut xml = String::new();
        archive
            .by_name("word/document.xml")
            .unwrap()
            .read_to_string(&mut xml)
            .unwrap();
        assert!(xml.contains("Tên Loại"));
        assert!(xml.contains("Toyota &amp; Co"));
        assert!(xml.contains("sedan.png"));
    }

    #[test]
    fn empty_docx_keeps_the_header_row() {
        let bytes = ExportService::to_docx(&empty()).unwrap();
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut xml = String::new();
        archive
            .by_name("word/document.xml")
            .unwrap()
            .read_to_string(&mut xml)
            .unwrap();
        assert_eq!(xml.matches("<w:tr>").count(), 1);
    }

    #[test]
    fn control_characters_are_dropped_from_docx() {
        let mut table = empty();
        table.rows.push(vec!["7".into(), "Bad\u{1}Name\u{b}".into(), "A < B".into()]);
        let xml = String::from_utf8(document_xml(&table).unwrap()).unwrap();

        assert!(!xml.contains('\u{1}'));
        assert!(!xml.contains('\u{b}'));
        assert!(xml.contains("BadName"));
        assert!(xml.contains("A &lt; B"));

        let mut reader = quick_xml::Reader::from_str(&xml);
        let mut cells = 0;
        loop {
            match reader.read_event() {
                Ok(quick_xml::events::Event::Start(tag)) if tag.name().as_ref() == b"w:tc" => cells += 1,
                Ok(quick_xml::events::Event::Eof) => break,
                Ok(_) => {}
                Err(err) => panic!("document.xml is not well formed: {}", err),
            }
        }
        assert_eq!(cells, table.columns.len() + 3);
    }

    #[test]
    fn xml_safe_keeps_clean_text_borrowed() {
        assert!(matches!(xml_safe("Tên Loại\tok"), Cow::Borrowed(_)));
        assert_eq!(xml_safe("a\u{0}b\u{FFFE}"), "ab");
    }

    #[test]
    fn vehicle_type_rows_include_counts() {
        let table = sample();
        assert_eq!(table.columns.len(), 5);
        assert_eq!(table.rows[0], vec!["1", "SUV", "Toyota & Co", "", "4"]);
        assert_eq!(table.rows[1][4], "0");
    }

    #[test]
    fn offsets_follow_column_widths() {
        let offsets = column_offsets(&[("a", 1.0), ("b", 3.0)], 100.0);
        assert_eq!(offsets, vec![0.0, 25.0]);
        assert_eq!(truncate("abcdef", 4), "abc…");
        assert_eq!(truncate("abc", 4), "abc");
    }
}
