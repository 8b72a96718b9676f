//! Enrichment runs against a scripted lookup

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use egrul_client::{DirectorLookup, EgrulError, EgrulResult};
use egrul_sheets::prelude::*;
use egrul_sheets::{output_path_for, EnrichError};
use pretty_assertions::assert_eq;

/// Answers from a fixed table and records every INN it was asked for
#[derive(Default)]
struct ScriptedLookup {
    answers: HashMap<String, Option<String>>,
    failing: Vec<String>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedLookup {
    fn answer(mut self, inn: &str, fio: Option<&str>) -> Self {
        self.answers.insert(inn.to_string(), fio.map(str::to_string));
        self
    }

    fn fail(mut self, inn: &str) -> Self {
        self.failing.push(inn.to_string());
        self
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl DirectorLookup for ScriptedLookup {
    async fn find_director(&self, inn: &str) -> EgrulResult<Option<String>> {
        self.calls.lock().unwrap().push(inn.to_string());
        if self.failing.iter().any(|f| f == inn) {
            let err: serde_json::Error = serde_json::from_str::<u8>("x").unwrap_err();
            return Err(EgrulError::Decode(err));
        }
        Ok(self.answers.get(inn).cloned().flatten())
    }
}

fn options() -> EnrichOptions {
    EnrichOptions {
        row_delay: Duration::ZERO,
        ..Default::default()
    }
}

/// Header + four records; INNs in column E as numbers and strings
fn registry() -> Worksheet {
    let mut ws = Worksheet::new("Реестр");
    for (c, h) in ["№", "Наименование", "Адрес", "Телефон", "ИНН"].iter().enumerate() {
        ws.set_cell_value_at(0, c as u16, *h).unwrap();
    }
    ws.set_cell_value("B2", "ООО Ромашка").unwrap();
    ws.set_cell_value("E2", 7707083893.0).unwrap();
    ws.set_cell_value("B3", "ИП Петров").unwrap();
    ws.set_cell_value("E3", " 500100732259 ").unwrap();
    ws.set_cell_value("B4", "Без ИНН").unwrap();
    ws.set_cell_value("E4", "   ").unwrap();
    ws.set_cell_value("B5", "АО Сбой").unwrap();
    ws.set_cell_value("E5", "7736050003").unwrap();
    ws
}

#[tokio::test]
async fn test_fills_new_column() {
    let lookup = ScriptedLookup::default()
        .answer("7707083893", Some("Жигарев Антон Вячеславович"))
        .answer("500100732259", None)
        .fail("7736050003");
    let enricher = Enricher::new(&lookup, options());

    let mut ws = registry();
    let report = enricher.enrich(&mut ws).await.unwrap();

    assert_eq!(
        report,
        EnrichReport {
            rows: 4,
            filled: 1,
            not_found: 1,
            failed: 1,
            skipped: 1,
            fio_column_index: 5,
            created_column: true,
        }
    );
    assert_eq!(lookup.calls(), vec!["7707083893", "500100732259", "7736050003"]);

    assert_eq!(ws.get_value("F1").unwrap().as_string(), Some("ФИО"));
    assert_eq!(
        ws.get_value("F2").unwrap().as_string(),
        Some("Жигарев Антон Вячеславович")
    );
    assert!(ws.get_value("F3").unwrap().is_empty());
    assert!(ws.get_value("F4").unwrap().is_empty());
    assert!(ws.get_value("F5").unwrap().is_empty());
    // Source columns are untouched
    assert_eq!(ws.get_value("E2").unwrap().as_number(), Some(7707083893.0));
}

#[tokio::test]
async fn test_overwrites_existing_column() {
    let lookup = ScriptedLookup::default().answer("7707083893", Some("Новый Директор"));
    let enricher = Enricher::new(&lookup, options());

    let mut ws = Worksheet::new("Sheet1");
    for (c, h) in ["A", "ФИО", "C", "D", "ИНН", "F"].iter().enumerate() {
        ws.set_cell_value_at(0, c as u16, *h).unwrap();
    }
    ws.set_cell_value("B2", "Старый Директор").unwrap();
    ws.set_cell_value("E2", "7707083893").unwrap();
    ws.set_cell_value("B3", "Устаревшее").unwrap();

    let report = enricher.enrich(&mut ws).await.unwrap();
    assert!(!report.created_column);
    assert_eq!(report.fio_column_index, 1);
    assert_eq!(report.skipped, 1);

    assert_eq!(ws.get_value("B2").unwrap().as_string(), Some("Новый Директор"));
    assert!(ws.get_value("B3").unwrap().is_empty());
    assert!(ws.get_value("G1").unwrap().is_empty());
}

#[tokio::test]
async fn test_too_few_columns_leaves_sheet_untouched() {
    let lookup = ScriptedLookup::default();
    let enricher = Enricher::new(&lookup, options());

    let mut ws = Worksheet::new("Sheet1");
    ws.set_cell_value("A1", "Наименование").unwrap();
    ws.set_cell_value("D1", "ИНН").unwrap();
    ws.set_cell_value("D2", "7707083893").unwrap();
    let before = ws.clone();

    let err = enricher.enrich(&mut ws).await.unwrap_err();
    assert!(matches!(
        err,
        EnrichError::TooFewColumns {
            required: 5,
            found: 4
        }
    ));
    assert_eq!(ws, before);
    assert!(lookup.calls().is_empty());
}

#[tokio::test]
async fn test_limit_stops_early() {
    let lookup = ScriptedLookup::default()
        .answer("7707083893", Some("Первый"))
        .answer("500100732259", Some("Второй"));
    let enricher = Enricher::new(
        &lookup,
        EnrichOptions {
            limit: Some(1),
            ..options()
        },
    );

    let mut ws = registry();
    let report = enricher.enrich(&mut ws).await.unwrap();
    assert_eq!(report.filled, 1);
    assert_eq!(lookup.calls(), vec!["7707083893"]);
    assert!(ws.get_value("F3").unwrap().is_empty());
}

#[tokio::test]
async fn test_custom_inn_column() {
    let lookup = ScriptedLookup::default().answer("7707083893", Some("Иванов И.И."));
    let enricher = Enricher::new(
        &lookup,
        EnrichOptions {
            inn_column: 1,
            fio_column: "Руководитель".to_string(),
            ..options()
        },
    );

    let mut ws = Worksheet::new("Sheet1");
    ws.set_cell_value("A1", "ИНН").unwrap();
    ws.set_cell_value("A2", 7707083893.0).unwrap();

    enricher.enrich(&mut ws).await.unwrap();
    assert_eq!(ws.get_value("B1").unwrap().as_string(), Some("Руководитель"));
    assert_eq!(ws.get_value("B2").unwrap().as_string(), Some("Иванов И.И."));
}

#[tokio::test]
async fn test_enrich_file_writes_single_sheet() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("Список рассылки свод.xlsx");

    let mut wb = Workbook::empty();
    wb.add_existing_worksheet(Worksheet::new("Заметки")).unwrap();
    wb.add_existing_worksheet(registry()).unwrap();
    wb.save(&input).unwrap();

    let lookup = ScriptedLookup::default().answer("7707083893", Some("Жигарев Антон Вячеславович"));
    let enricher = Enricher::new(
        &lookup,
        EnrichOptions {
            sheet: 1,
            ..options()
        },
    );

    let output = output_path_for(&input);
    assert!(output.ends_with("Список рассылки свод_с_ФИО.xlsx"));

    let report = enricher.enrich_file(&input, &output).await.unwrap();
    assert_eq!(report.filled, 1);

    let result = Workbook::open(&output).unwrap();
    assert_eq!(result.sheet_count(), 1);
    let sheet = result.worksheet(0).unwrap();
    assert_eq!(sheet.name(), "Реестр");
    assert_eq!(sheet.get_value("F1").unwrap().as_string(), Some("ФИО"));
    assert_eq!(
        sheet.get_value("F2").unwrap().as_string(),
        Some("Жигарев Антон Вячеславович")
    );

    // Input is not modified
    let original = Workbook::open(&input).unwrap();
    assert_eq!(original.sheet_count(), 2);
    assert!(original.worksheet(1).unwrap().get_value("F1").unwrap().is_empty());
}

#[tokio::test]
async fn test_enrich_file_missing_sheet() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("reg.xlsx");
    Workbook::new().save(&input).unwrap();

    let lookup = ScriptedLookup::default();
    let enricher = Enricher::new(
        &lookup,
        EnrichOptions {
            sheet: 4,
            ..options()
        },
    );
    let err = enricher
        .enrich_file(&input, &output_path_for(&input))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        EnrichError::Workbook(egrul_sheets::Error::SheetOutOfBounds(4, 1))
    ));
}

#[tokio::test(start_paused = true)]
async fn test_row_delay_follows_looked_up_rows_only() {
    let lookup = ScriptedLookup::default().answer("7707083893", Some("Жигарев Антон Вячеславович"));
    let enricher = Enricher::new(
        &lookup,
        EnrichOptions {
            row_delay: Duration::from_millis(500),
            ..Default::default()
        },
    );

    let mut ws = Worksheet::new("Реестр");
    for (c, h) in ["№", "Наименование", "Адрес", "Телефон", "ИНН"].iter().enumerate() {
        ws.set_cell_value_at(0, c as u16, *h).unwrap();
    }
    ws.set_cell_value("E2", 7707083893.0).unwrap();
    ws.set_cell_value("B3", "Без ИНН").unwrap();

    let started = tokio::time::Instant::now();
    let report = enricher.enrich(&mut ws).await.unwrap();

    assert_eq!(started.elapsed(), Duration::from_millis(500));
    assert_eq!(report.filled, 1);
    assert_eq!(report.skipped, 1);
    assert_eq!(lookup.calls(), vec!["7707083893"]);
}
