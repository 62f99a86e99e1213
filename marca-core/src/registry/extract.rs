use regex::Regex;
use serde::{Deserialize, Serialize};

use super::form::FRAME_WALK;

/// Phrases the registry uses to say a search matched nothing. Any of them
/// short-circuits extraction to an "available" verdict.
pub const NO_RESULTS_PHRASES: &[&str] = &[
    "Nenhum registro encontrado",
    "Não foram encontrados",
    "Nenhum resultado foi encontrado",
];

/// Keyword fragments that mark a cell as the process-situation column.
pub const SITUATION_KEYWORDS: &[&str] =
    &["arquivad", "vigor", "extint", "conferid", "pedido", "registro"];

/// Situation fragments that mean a process no longer blocks the name.
pub const EXTINGUISHED_KEYWORDS: &[&str] =
    &["extinto", "arquivado", "indeferido", "cancelado", "expirado"];

const FALLBACK_SITUATION: &str = "Status não identificado";
const MAX_RECORDS: usize = 20;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrademarkRecord {
    pub brand_name: String,
    pub process_number: String,
    pub situation: String,
}

/// Raw material harvested from the results frame: the rendered body text
/// (for the no-results phrases) and the cell texts of every table row with
/// at least three cells.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HarvestPayload {
    pub body_text: String,
    pub rows: Vec<Vec<String>>,
}

/// Script that picks the frame context holding the results (falling back to
/// the main document) and harvests its rows. Row classification itself
/// happens on the Rust side so it stays testable without a browser.
pub fn harvest_script() -> String {
    format!(
        r##"(() => {{
{FRAME_WALK}
    const looksLikeResults = (doc) => {{
        try {{
            const html = doc.body ? doc.body.innerHTML : '';
            if (html.includes('tabela_resultados') || html.includes('Nenhum registro')) return true;
            if (doc.querySelector('font.normal[color="#000000"], a.visitado')) return true;
        }} catch (err) {{}}
        return false;
    }};
    let chosen = contexts[0];
    for (const doc of contexts) {{
        if (looksLikeResults(doc)) {{ chosen = doc; break; }}
    }}
    const rows = [];
    chosen.querySelectorAll('tr').forEach(row => {{
        const cells = row.querySelectorAll('td');
        if (cells.length >= 3) {{
            rows.push(Array.from(cells).map(cell => (cell.innerText || '').trim()));
        }}
    }});
    return {{
        body_text: chosen.body ? chosen.body.innerText : '',
        rows,
    }};
}})()"##
    )
}

/// Turns harvested rows into trademark records by content heuristics. The
/// substring name match is intentionally loose; tightening it would change
/// observable classification behavior.
#[derive(Debug, Clone)]
pub struct RecordExtractor {
    digit_strip: Regex,
}

impl Default for RecordExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordExtractor {
    pub fn new() -> Self {
        let digit_strip = Regex::new(r"[^0-9]").expect("valid regex");
        Self { digit_strip }
    }

    /// True when the rendered text carries an explicit no-results phrase.
    pub fn no_results(&self, body_text: &str) -> bool {
        NO_RESULTS_PHRASES
            .iter()
            .any(|phrase| body_text.contains(phrase))
    }

    /// A row becomes a record iff some cell contains the search name
    /// (case-insensitive) and some cell carries a process number of at
    /// least 8 digits. Extraction is capped at 20 records.
    pub fn extract(&self, search_name: &str, rows: &[Vec<String>]) -> Vec<TrademarkRecord> {
        let needle = search_name.to_lowercase();
        let mut records = Vec::new();

        for cells in rows {
            if records.len() >= MAX_RECORDS {
                break;
            }
            let lowered: Vec<String> = cells.iter().map(|cell| cell.to_lowercase()).collect();
            if !lowered.iter().any(|cell| cell.contains(&needle)) {
                continue;
            }

            let process_number = cells.iter().find_map(|cell| {
                let digits = self.digit_strip.replace_all(cell, "");
                (digits.len() >= 8).then(|| cell.trim().to_string())
            });
            // Rows matching the name but carrying no process number are
            // never materialized.
            let process_number = match process_number {
                Some(number) => number,
                None => continue,
            };

            let brand_name = cells
                .iter()
                .zip(&lowered)
                .find(|(_, lower)| lower.contains(&needle))
                .map(|(cell, _)| cell.trim().to_string())
                .unwrap_or_else(|| search_name.to_string());

            let situation = cells
                .iter()
                .zip(&lowered)
                .find(|(_, lower)| {
                    SITUATION_KEYWORDS
                        .iter()
                        .any(|keyword| lower.contains(keyword))
                })
                .map(|(cell, _)| cell.trim().to_string())
                .or_else(|| {
                    cells
                        .iter()
                        .rev()
                        .find(|cell| cell.trim().len() > 2)
                        .map(|cell| cell.trim().to_string())
                })
                .unwrap_or_else(|| FALLBACK_SITUATION.to_string());

            records.push(TrademarkRecord {
                brand_name,
                process_number,
                situation,
            });
        }

        records
    }
}

/// A record list still blocks the name unless every situation reads as
/// extinguished. An empty list blocks nothing.
pub fn is_active(records: &[TrademarkRecord]) -> bool {
    if records.is_empty() {
        return false;
    }
    let all_extinct = records.iter().all(|record| {
        let situation = record.situation.to_lowercase();
        EXTINGUISHED_KEYWORDS
            .iter()
            .any(|keyword| situation.contains(keyword))
    });
    !all_extinct
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|cell| cell.to_string()).collect()
    }

    #[test]
    fn converts_matching_row_with_process_number() {
        let extractor = RecordExtractor::new();
        let rows = vec![row(&["ACME CORP", "000123456789", "Em vigor"])];
        let records = extractor.extract("acme", &rows);
        assert_eq!(
            records,
            vec![TrademarkRecord {
                brand_name: "ACME CORP".into(),
                process_number: "000123456789".into(),
                situation: "Em vigor".into(),
            }]
        );
    }

    #[test]
    fn row_without_process_number_is_discarded() {
        let extractor = RecordExtractor::new();
        let rows = vec![row(&["ACME CORP", "sem número", "Em vigor"])];
        assert!(extractor.extract("acme", &rows).is_empty());
    }

    #[test]
    fn row_without_name_match_is_discarded() {
        let extractor = RecordExtractor::new();
        let rows = vec![row(&["OUTRA MARCA", "000123456789", "Em vigor"])];
        assert!(extractor.extract("acme", &rows).is_empty());
    }

    #[test]
    fn short_digit_runs_do_not_count_as_process_numbers() {
        let extractor = RecordExtractor::new();
        let rows = vec![row(&["ACME", "1234567", "Em vigor"])];
        assert!(extractor.extract("acme", &rows).is_empty());
    }

    #[test]
    fn formatted_process_numbers_keep_their_raw_text() {
        let extractor = RecordExtractor::new();
        let rows = vec![row(&["ACME", "912.345.678", "Registro de marca"])];
        let records = extractor.extract("acme", &rows);
        assert_eq!(records[0].process_number, "912.345.678");
    }

    #[test]
    fn situation_falls_back_to_last_non_trivial_cell() {
        let extractor = RecordExtractor::new();
        let rows = vec![row(&["ACME", "000123456789", "??", "Deferimento em exame"])];
        let records = extractor.extract("acme", &rows);
        assert_eq!(records[0].situation, "Deferimento em exame");
    }

    #[test]
    fn situation_fallback_skips_trivial_cells() {
        let extractor = RecordExtractor::new();
        let rows = vec![row(&["acme", "00012345678", ".."])];
        let records = extractor.extract("acme", &rows);
        // No situation keyword anywhere; the last cell is too short, so the
        // fallback lands on the process-number cell.
        assert_eq!(records[0].situation, "00012345678");
    }

    #[test]
    fn extraction_caps_at_twenty_records() {
        let extractor = RecordExtractor::new();
        let rows: Vec<Vec<String>> = (0..30)
            .map(|i| row(&["ACME", &format!("9000000{i:02}"), "Em vigor"]))
            .collect();
        assert_eq!(extractor.extract("acme", &rows).len(), 20);
    }

    #[test]
    fn substring_match_accepts_unrelated_rows_containing_the_name() {
        // Known looseness, preserved on purpose.
        let extractor = RecordExtractor::new();
        let rows = vec![row(&["MEGACMEX LTDA", "000987654321", "Em vigor"])];
        assert_eq!(extractor.extract("acme", &rows).len(), 1);
    }

    #[test]
    fn no_results_phrases_are_detected() {
        let extractor = RecordExtractor::new();
        assert!(extractor.no_results("Nenhum registro encontrado para a consulta"));
        assert!(!extractor.no_results("10 processos listados"));
    }

    #[test]
    fn is_active_unless_every_situation_is_extinguished() {
        let live = TrademarkRecord {
            brand_name: "A".into(),
            process_number: "12345678".into(),
            situation: "Em vigor".into(),
        };
        let dead = TrademarkRecord {
            brand_name: "B".into(),
            process_number: "87654321".into(),
            situation: "Registro extinto".into(),
        };
        assert!(is_active(&[live.clone(), dead.clone()]));
        assert!(!is_active(&[dead.clone()]));
        assert!(!is_active(&[]));
        let archived = TrademarkRecord {
            situation: "Arquivado definitivamente".into(),
            ..dead
        };
        assert!(!is_active(&[archived]));
    }
}
