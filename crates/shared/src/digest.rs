use crate::arxiv::Paper;

/// Render the notification email body. Pure function; papers appear in the
/// order the provider returned them (newest submission first).
pub fn render_digest(name: &str, papers: &[Paper]) -> String {
    let mut html = String::new();

    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<body>\n");
    html.push_str("<div style=\"background-color:#eee;padding:10px 20px;\">\n");
    html.push_str(&format!(
        "  <h2 style=\"font-family:Georgia, 'Times New Roman', Times, serif;color:#454349;\">Hi {}, here is your arXiv update!</h2>\n",
        name
    ));
    html.push_str("</div>\n");

    for paper in papers {
        html.push_str(
            "<div style=\"padding-bottom:20px; padding-left:10px; padding-right: 10px\">\n",
        );
        html.push_str("  <div style=\"text-align:center;\">\n");
        html.push_str(&format!("    <h3>{}</h3>\n", paper.title));
        html.push_str(&format!("    <p>{}</p>\n", paper.authors.join(", ")));
        html.push_str(&format!("    <p>{}</p>\n", paper.summary));
        html.push_str(&format!(
            "    <a href=\"{}\">Go to paper page</a>\n",
            paper.entry_id
        ));
        html.push_str("  </div>\n</div>\n<hr>\n");
    }

    html.push_str("</body>\n</html>\n");
    html
}
