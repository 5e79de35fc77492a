//! Page selection and the bundled renderer
//!
//! Real templating lives outside this crate behind [`PageRenderer`];
//! [`BasicRenderer`] is a plain implementation that keeps the edge usable
//! on its own.

use async_trait::async_trait;
use http::StatusCode;
use serde_json::Value;
use std::fmt::Debug;

use super::request::RequestInfo;
use super::response::HTML;
use crate::backend::{item_path, ApiResponse, MediaClient, Query};
use crate::indexing::KeywordCatalog;
use crate::security::decoy::escape_html;
use crate::site::{EffectiveConfig, SiteConfig};

/// Page a request resolves to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Page {
    Home { page: u32 },
    Content { id: i64 },
    Album { id: i64 },
    Search { q: String, page: u32 },
    Category { kind: String, page: u32 },
    Tag { tag: String, page: u32 },
    Static { slug: String },
    Landing { keyword: String },
    Feed { name: String },
    NotFound,
}

/// Leading digits of a segment such as `123-some-title`
fn leading_id(segment: &str) -> Option<i64> {
    let digits: String = segment.chars().take_while(char::is_ascii_digit).collect();
    digits.parse().ok()
}

fn page_number(req: &RequestInfo, segment: Option<&str>) -> u32 {
    req.query_param("page")
        .as_deref()
        .or(segment)
        .and_then(|p| p.parse::<u32>().ok())
        .unwrap_or(1)
        .max(1)
}

impl Page {
    /// Map a screened request onto a page
    pub fn route(req: &RequestInfo, effective: &EffectiveConfig, catalog: &KeywordCatalog) -> Page {
        let site = &effective.base;
        let rest = site.strip_base_path(&req.path).trim_end_matches('/');
        if rest.is_empty() {
            return Page::Home { page: page_number(req, None) };
        }

        if let Some(keyword) = catalog.match_path(&format!("/{}", rest)) {
            return Page::Landing { keyword: keyword.to_string() };
        }

        let segments: Vec<&str> = rest.split('/').collect();
        let first = segments[0].to_lowercase();
        let second = segments.get(1).copied();
        let third = segments.get(2).copied();
        let paths = &site.paths;

        if first == paths.content {
            return second.and_then(leading_id).map_or(Page::NotFound, |id| Page::Content { id });
        }
        if first == paths.album {
            if !effective.album_route_allowed() {
                return Page::NotFound;
            }
            return second.and_then(leading_id).map_or(Page::NotFound, |id| Page::Album { id });
        }
        if first == paths.search {
            let q = req.query_param("q").unwrap_or_default();
            return Page::Search { q, page: page_number(req, None) };
        }
        if first == paths.category {
            let kind: String = second
                .unwrap_or("")
                .to_lowercase()
                .chars()
                .filter(|c| c.is_ascii_lowercase())
                .collect();
            if !effective.content_types().contains(&kind.as_str()) {
                return Page::NotFound;
            }
            return Page::Category { kind, page: page_number(req, third) };
        }
        if first == paths.tag {
            let raw = second.unwrap_or("");
            let tag = urlencoding::decode(raw).map(|t| t.into_owned()).unwrap_or_else(|_| raw.to_string());
            if tag.trim().is_empty() {
                return Page::NotFound;
            }
            return Page::Tag { tag, page: page_number(req, third) };
        }
        if segments.len() == 1 && paths.static_pages().contains(&first.as_str()) {
            return Page::Static { slug: first };
        }
        if segments.len() == 1 && matches!(first.as_str(), "sitemap.xml" | "rss.xml" | "feed.xml" | "feed") {
            return Page::Feed { name: first };
        }
        Page::NotFound
    }
}

/// A rendered page ready for post-processing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered {
    pub status: StatusCode,
    pub content_type: &'static str,
    pub body: String,
}

impl Rendered {
    pub fn html(status: StatusCode, body: String) -> Self {
        Self { status, content_type: HTML, body }
    }
}

/// Turns a page into markup using the backend client
#[async_trait]
pub trait PageRenderer: Send + Sync + Debug {
    async fn render(&self, page: &Page, client: &MediaClient, site: &EffectiveConfig) -> Rendered;
}

/// `robots.txt` for a site; every agent is kept out of the honeypot prefix
pub fn robots_txt(domain: &str, honeypot_prefix: &str) -> String {
    let trap = format!("Disallow: /{}/", honeypot_prefix);
    format!(
        "# robots.txt for {domain}\n\
         User-agent: *\nAllow: /\n{trap}\nDisallow: /track\nCrawl-delay: 2\n\n\
         User-agent: Googlebot\nAllow: /\n{trap}\n\n\
         User-agent: Googlebot-Image\nAllow: /\n\n\
         User-agent: Bingbot\nAllow: /\n{trap}\nCrawl-delay: 3\n\n\
         User-agent: AhrefsBot\n{trap}\nDisallow: /?\nCrawl-delay: 10\n\n\
         User-agent: SemrushBot\n{trap}\nCrawl-delay: 10\n\n\
         User-agent: AdsBot-Google\nDisallow: /\n\n\
         Sitemap: https://{domain}/sitemap.xml\n"
    )
}

/// Minimal built-in renderer
#[derive(Debug, Clone, Copy, Default)]
pub struct BasicRenderer;

fn str_field<'a>(item: &'a Value, name: &str) -> &'a str {
    item.get(name).and_then(Value::as_str).unwrap_or("")
}

fn item_list(resp: &ApiResponse, site: &SiteConfig) -> String {
    let items = resp.items();
    if items.is_empty() {
        let note = resp.message.as_deref().unwrap_or("Belum ada konten.");
        return format!(r#"<p class="empty">{}</p>"#, escape_html(note));
    }
    let entries: String = items
        .iter()
        .map(|item| {
            format!(
                r#"<li><a href="{}">{}</a></li>"#,
                escape_html(&item_path(item, site)),
                escape_html(str_field(item, "title"))
            )
        })
        .collect();
    format!("<ul>{}</ul>", entries)
}

fn layout(site: &SiteConfig, title: &str, description: &str, main: &str) -> String {
    format!(
        r#"<!DOCTYPE html><html lang="{lang}"><head><meta charset="UTF-8"><title>{title}</title><meta name="description" content="{desc}"><meta name="keywords" content="{keywords}"></head><body><header><a href="{home}/">{name}</a></header><main>{main}</main><footer>{name}</footer></body></html>"#,
        lang = escape_html(&site.seo.lang),
        title = escape_html(title),
        desc = escape_html(description),
        keywords = escape_html(&site.seo.keywords),
        home = escape_html(&site.base_path),
        name = escape_html(&site.name),
        main = main,
    )
}

impl BasicRenderer {
    fn page(&self, site: &SiteConfig, title: &str, main: String) -> Rendered {
        let full_title = format!("{} | {}", title, site.name);
        Rendered::html(StatusCode::OK, layout(site, &full_title, &site.seo.default_description, &main))
    }

    fn not_found(&self, site: &SiteConfig) -> Rendered {
        let body = layout(site, "404", &site.seo.default_description, "<h1>Halaman tidak ditemukan</h1>");
        Rendered::html(StatusCode::NOT_FOUND, body)
    }

    fn feed(&self, name: &str, resp: &ApiResponse, site: &SiteConfig) -> Rendered {
        let items = resp.items();
        let body = if name == "sitemap.xml" {
            let urls: String = std::iter::once(site.absolute_url(""))
                .chain(items.iter().map(|item| site.absolute_url(site.strip_base_path(&item_path(item, site)))))
                .map(|url| format!("<url><loc>{}</loc></url>", escape_html(&url)))
                .collect();
            format!(
                r#"<?xml version="1.0" encoding="UTF-8"?><urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">{}</urlset>"#,
                urls
            )
        } else {
            let entries: String = items
                .iter()
                .map(|item| {
                    let link = site.absolute_url(site.strip_base_path(&item_path(item, site)));
                    format!(
                        "<item><title>{}</title><link>{}</link></item>",
                        escape_html(str_field(item, "title")),
                        escape_html(&link)
                    )
                })
                .collect();
            format!(
                r#"<?xml version="1.0" encoding="UTF-8"?><rss version="2.0"><channel><title>{}</title><link>{}</link>{}</channel></rss>"#,
                escape_html(&site.name),
                escape_html(&site.base_url),
                entries
            )
        };
        Rendered { status: StatusCode::OK, content_type: "application/xml; charset=UTF-8", body }
    }
}

#[async_trait]
impl PageRenderer for BasicRenderer {
    async fn render(&self, page: &Page, client: &MediaClient, effective: &EffectiveConfig) -> Rendered {
        let site = effective.base.as_ref();
        match page {
            Page::Home { page } => {
                let listing = Query::page(*page).with("per_page", site.items_per_page).with("sort", "newest");
                let (trending, latest) =
                    futures::join!(client.trending(site.trending_count, None), client.media_list(listing));
                let main = format!(
                    "<h1>{}</h1><section>{}</section><aside><h2>Trending</h2>{}</aside>",
                    escape_html(&site.tagline),
                    item_list(&latest, site),
                    item_list(&trending, site)
                );
                self.page(site, &site.tagline, main)
            }
            Page::Content { id } | Page::Album { id } => {
                let is_album = matches!(page, Page::Album { .. });
                let (detail, related) = if is_album {
                    futures::join!(client.album(*id), client.related(*id, site.related_count))
                } else {
                    futures::join!(client.media_detail(*id), client.related(*id, site.related_count))
                };
                let Some(item) = detail.items().into_iter().next() else {
                    return self.not_found(site);
                };
                let title = str_field(&item, "title").to_string();
                let player = if is_album {
                    String::new()
                } else {
                    let id = u64::try_from(*id).unwrap_or_default();
                    format!(
                        r#"<iframe src="{}" allowfullscreen></iframe><a href="{}" rel="nofollow">Download</a>"#,
                        escape_html(&client.player_url(id)),
                        escape_html(&client.download_url(id))
                    )
                };
                let main = format!(
                    "<h1>{}</h1>{}<aside><h2>Terkait</h2>{}</aside>",
                    escape_html(&title),
                    player,
                    item_list(&related, site)
                );
                self.page(site, &title, main)
            }
            Page::Search { q, page } => {
                let results = client.search(q, Query::page(*page).with("per_page", site.items_per_page)).await;
                let main = format!(
                    r#"<h1>Cari: {}</h1><form action="{}/{}"><input name="q" value="{}"></form>{}"#,
                    escape_html(q),
                    escape_html(&site.base_path),
                    escape_html(&site.paths.search),
                    escape_html(q),
                    item_list(&results, site)
                );
                self.page(site, &format!("Cari {}", q), main)
            }
            Page::Category { kind, page } => {
                let listing = Query::page(*page)
                    .with("per_page", site.items_per_page)
                    .with("type", kind)
                    .with("sort", "newest");
                let (items, trending) = futures::join!(
                    client.media_list(listing),
                    client.trending(site.trending_count, Some(kind.as_str()))
                );
                let main = format!(
                    "<h1>{}</h1>{}<aside>{}</aside>",
                    escape_html(kind),
                    item_list(&items, site),
                    item_list(&trending, site)
                );
                self.page(site, kind, main)
            }
            Page::Tag { tag, page } => {
                let query = Query::page(*page).with("per_page", site.items_per_page);
                let (items, trending) = futures::join!(client.by_tag(tag, query), client.trending(6, None));
                let main = format!(
                    "<h1>#{}</h1>{}<aside>{}</aside>",
                    escape_html(tag),
                    item_list(&items, site),
                    item_list(&trending, site)
                );
                self.page(site, tag, main)
            }
            Page::Static { slug } => {
                let main = format!(
                    r#"<h1>{}</h1><p>{}</p><p><a href="mailto:{}">{}</a></p>"#,
                    escape_html(slug),
                    escape_html(&site.seo.default_description),
                    escape_html(&site.contact_email),
                    escape_html(&site.contact_email_name)
                );
                self.page(site, slug, main)
            }
            Page::Landing { keyword } => {
                let mut items =
                    client.search(keyword, Query::new().with("per_page", 24).with("sort", "popular")).await;
                if items.items().is_empty() {
                    items = client.trending(24, None).await;
                }
                let title = format!("{} - Nonton Gratis di {}", keyword, site.name);
                let main = format!("<h1>{}</h1>{}", escape_html(keyword), item_list(&items, site));
                Rendered::html(StatusCode::OK, layout(site, &title, &site.seo.default_description, &main))
            }
            Page::Feed { name } => {
                let resp = if name == "sitemap.xml" {
                    client.trending(100, None).await
                } else {
                    client.media_list(Query::new().with("per_page", 20).with("sort", "newest")).await
                };
                self.feed(name, &resp, site)
            }
            Page::NotFound => self.not_found(site),
        }
    }
}
