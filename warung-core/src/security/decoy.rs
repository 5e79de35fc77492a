//! Harmless pages served to trapped or headless clients

/// Escape text for HTML bodies and attribute values
pub fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Self-refreshing page with a fake progress animation and no real links
pub fn blackhole_page(timeline: u32) -> String {
    format!(
        r#"<!DOCTYPE html><html><head><title>Loading Timeline {tl}...</title>
<style>body{{background:#000;color:#0f0;font-family:monospace;padding:50px}}.timeline{{font-size:10px;color:#0a0;margin-top:20px}}</style>
<meta http-equiv="refresh" content="3"></head><body>
<h1>Synchronizing</h1><p>You have entered timeline {tl}</p>
<div class="timeline"><p>Loading state... ████████░░ 80%</p></div>
<script>let i=0;setInterval(()=>{{document.querySelector('.timeline').innerHTML='<p>Syncing... '+'█'.repeat(i%10)+'░'.repeat(10-i%10)+' '+(i%100)+'%</p>';i++;}},300);</script>
</body></html>"#,
        tl = timeline
    )
}

const TRAP_SLUGS: [&str; 4] = ["a1b2c3", "x9y8z7", "m3n4o5", "p7q6r5"];

/// Bland landing page whose only links are invisible and lead into the
/// honeypot prefix
pub fn fake_landing_page(site_name: &str, honeypot_prefix: &str) -> String {
    let links: String = TRAP_SLUGS
        .iter()
        .map(|slug| {
            format!(
                r#"<a href="{}" style="display:none" aria-hidden="true">more</a>"#,
                escape_html(&format!("/{}/{}", honeypot_prefix, slug))
            )
        })
        .collect();
    format!(
        r#"<!DOCTYPE html><html lang="id"><head><meta charset="UTF-8"><title>{}</title></head><body><h1>Selamat Datang</h1><p>Konten tersedia. Silakan refresh.</p>{}</body></html>"#,
        escape_html(site_name),
        links
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_markup() {
        assert_eq!(escape_html(r#"<a href="x">&'"#), "&lt;a href=&quot;x&quot;&gt;&amp;&#39;");
    }

    #[test]
    fn blackhole_refreshes_itself() {
        let page = blackhole_page(417);
        assert!(page.contains("<title>Loading Timeline 417...</title>"));
        assert!(page.contains(r#"<meta http-equiv="refresh" content="3">"#));
        assert!(!page.contains("href="));
    }

    #[test]
    fn fake_landing_links_into_honeypot() {
        let page = fake_landing_page("Warung <Kita>", "hp");
        assert!(page.contains("<title>Warung &lt;Kita&gt;</title>"));
        assert_eq!(page.matches(r#"href="/hp/"#).count(), 4);
        assert_eq!(page.matches(r#"style="display:none""#).count(), 4);
    }
}
