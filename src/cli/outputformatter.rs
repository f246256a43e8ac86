use serde_json::Value;

use terminal_size::{terminal_size, Height, Width};

/// Render a list of records as an ASCII table no wider than `termw`.
///
/// `columns` picks and orders the fields; when `None`, the union of keys
/// across all records is used, sorted. Returns `None` for anything that is
/// not a non-empty array, so callers can fall back to JSON.
pub fn render_table(val: &Value, columns: Option<&[&str]>, termw: usize) -> Option<String> {
    let (cols, rows) = match columns {
        Some(c) => project(val, c)?,
        None => try_from_top_level_array(val)?,
    };
    if rows.is_empty() {
        return None;
    }

    let mut widths: Vec<usize> = cols.iter().map(|s| display_len(s).min(termw)).collect();
    for r in &rows {
        for (i, cell) in r.iter().enumerate().take(cols.len()) {
            let w = display_len(cell);
            if w > widths[i] {
                widths[i] = w.min(termw);
            }
        }
    }

    let sep = build_separator(&widths);
    let mut out = String::new();
    let mut push = |line: &str| {
        out.push_str(&fit_line_to_width(line, termw));
        out.push('\n');
    };
    push(&sep);
    push(&build_row(&cols, &widths, false));
    push(&sep);
    for r in &rows {
        push(&build_row(r, &widths, true));
    }
    push(&sep);
    push(&format!("rows: {}", rows.len()));
    Some(out)
}

/// `key: value` lines for a single record.
pub fn render_record(val: &Value, columns: &[&str]) -> String {
    let keyw = columns.iter().map(|c| c.len()).max().unwrap_or(0);
    let mut out = String::new();
    for c in columns {
        let cell = val.get(*c).map(to_cell_string).unwrap_or_default();
        out.push_str(&format!("{:<width$}  {}\n", c, cell, width = keyw));
    }
    out
}

fn project(val: &Value, columns: &[&str]) -> Option<(Vec<String>, Vec<Vec<String>>)> {
    let arr = val.as_array()?;
    let rows = arr
        .iter()
        .map(|el| columns.iter().map(|c| el.get(*c).map(to_cell_string).unwrap_or_default()).collect())
        .collect();
    Some((columns.iter().map(|c| c.to_string()).collect(), rows))
}

// If the top-level JSON is an array of objects, synthesize a table from the union of keys.
// Scalars map to a single column named "value".
fn try_from_top_level_array(val: &Value) -> Option<(Vec<String>, Vec<Vec<String>>)> {
    let arr = val.as_array()?;
    let mut all_keys: Vec<String> = Vec::new();
    let mut is_all_objects = true;
    for el in arr {
        if let Value::Object(map) = el {
            for k in map.keys() {
                if !all_keys.contains(k) {
                    all_keys.push(k.clone());
                }
            }
        } else {
            is_all_objects = false;
        }
    }
    if is_all_objects && !all_keys.is_empty() {
        all_keys.sort();
        let rows = arr
            .iter()
            .map(|el| all_keys.iter().map(|k| el.get(k).map(to_cell_string).unwrap_or_default()).collect())
            .collect();
        Some((all_keys, rows))
    } else {
        let rows = arr.iter().map(|el| vec![to_cell_string(el)]).collect();
        Some((vec!["value".to_string()], rows))
    }
}

fn to_cell_string(v: &Value) -> String {
    match v {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        // objects/arrays stay compact JSON
        other => other.to_string(),
    }
}

fn display_len(s: &str) -> usize {
    s.chars().count()
}

fn build_separator(widths: &[usize]) -> String {
    let mut s = String::from("+");
    for w in widths {
        s.push_str(&"-".repeat(*w + 2));
        s.push('+');
    }
    s
}

fn build_row(cells: &[String], widths: &[usize], align_numbers: bool) -> String {
    let mut s = String::from("|");
    for (i, w) in widths.iter().enumerate() {
        let cell = cells.get(i).map(String::as_str).unwrap_or("");
        let text = truncate(cell, *w);
        let pad = " ".repeat(w.saturating_sub(display_len(&text)));
        s.push(' ');
        if align_numbers && is_numeric_like(cell) {
            s.push_str(&pad);
            s.push_str(&text);
        } else {
            s.push_str(&text);
            s.push_str(&pad);
        }
        s.push_str(" |");
    }
    s
}

fn truncate(s: &str, max: usize) -> String {
    if display_len(s) <= max {
        return s.to_string();
    }
    if max <= 1 {
        return "…".to_string();
    }
    s.chars().take(max - 1).collect::<String>() + "…"
}

fn is_numeric_like(s: &str) -> bool {
    let st = s.trim();
    if st.is_empty() {
        return false;
    }
    let mut has_digit = false;
    for ch in st.chars() {
        if ch.is_ascii_digit() {
            has_digit = true;
            continue;
        }
        if ".-+eE,_".contains(ch) {
            continue;
        }
        return false;
    }
    has_digit
}

pub fn terminal_width() -> usize {
    match terminal_size() {
        Some((Width(w), Height(_))) if w > 8 => (w - 4) as usize,
        _ => 80,
    }
}

// Keep both ends of an over-long line, eliding the middle.
fn fit_line_to_width(s: &str, maxw: usize) -> String {
    let len = display_len(s);
    if len <= maxw {
        return s.to_string();
    }
    if maxw <= 3 {
        return ".".repeat(maxw);
    }
    let budget = maxw - 3;
    let front = budget / 2;
    let back = budget - front;
    let head: String = s.chars().take(front).collect();
    let tail: String = s.chars().skip(len - back).collect();
    format!("{}...{}", head, tail)
}
