//! CSV export of clustering preview rows.

use crate::types::PreviewRow;

/// Render preview rows as `(cluster_id, text, location)` CSV, suitable for
/// direct export by the caller. Text fields are quoted; embedded quotes are
/// doubled per RFC 4180.
pub fn preview_rows_to_csv(rows: &[PreviewRow]) -> String {
    let mut out = String::from("cluster_id,text,location\n");
    for row in rows {
        let text = row.text.replace('"', "\"\"");
        out.push_str(&format!(
            "{},\"{}\",{}\n",
            row.cluster_id,
            text,
            row.location.render()
        ));
    }
    out
}
