//! HTML pages.
//!
//! Each [`Page`] corresponds to one template of the site and renders into a
//! shared layout. Every piece of stored or submitted text passes through
//! [`escape`] before it reaches the markup.

use serde_json::Value;
use tracing::trace;

use crate::model::{Complaint, NewsItem, Timestamp, SUGGESTED_STATUSES};

/// Site title shown in the header and the `<title>` tag.
pub const SITE_NAME: &str = "Balai Desa";

/// Number of news items on the home page.
pub const HOME_NEWS_LIMIT: usize = 6;

/// Maximum length of a news excerpt in listings.
const EXCERPT_CHARS: usize = 160;

/// Message shown when a complaint is missing required fields.
pub const COMPLAINT_REQUIRED_MESSAGE: &str = "Nama dan isi pengaduan wajib diisi.";

/// A renderable page and the data it needs.
#[derive(Debug, Clone, Copy)]
pub enum Page<'a> {
    /// Home page with the latest news.
    Home {
        /// Newest-first news, already limited.
        news: &'a [NewsItem],
    },
    /// Full news listing.
    NewsList {
        /// Newest-first news.
        news: &'a [NewsItem],
    },
    /// A single news item.
    NewsDetail {
        /// The item to show.
        item: &'a NewsItem,
    },
    /// The public complaint form.
    ComplaintForm {
        /// Inline validation message, if the last submission was rejected.
        error: Option<&'a str>,
    },
    /// Confirmation after a complaint was stored.
    ComplaintSuccess,
    /// Admin overview of news and complaints.
    Dashboard {
        /// Newest-first news.
        news: &'a [NewsItem],
        /// Newest-first complaints.
        complaints: &'a [Complaint],
    },
    /// Unknown page or news item.
    NotFound,
}

impl Page<'_> {
    /// Template name of the page.
    #[must_use]
    pub fn template(&self) -> &'static str {
        match self {
            Self::Home { .. } => "index",
            Self::NewsList { .. } => "news",
            Self::NewsDetail { .. } => "news-detail",
            Self::ComplaintForm { .. } => "complaint-form",
            Self::ComplaintSuccess => "complaint-success",
            Self::Dashboard { .. } => "admin/dashboard",
            Self::NotFound => "404",
        }
    }

    /// Render the full HTML document.
    #[must_use]
    pub fn render(&self) -> String {
        trace!(template = self.template(), "Rendering page");
        match self {
            Self::Home { news } => layout("Beranda", &home(news)),
            Self::NewsList { news } => layout("Berita", &news_list(news)),
            Self::NewsDetail { item } => layout(&item.title, &news_detail(item)),
            Self::ComplaintForm { error } => layout("Pengaduan", &complaint_form(*error)),
            Self::ComplaintSuccess => layout("Pengaduan Terkirim", COMPLAINT_SUCCESS),
            Self::Dashboard { news, complaints } => {
                layout("Admin", &dashboard(news, complaints))
            }
            Self::NotFound => layout("Halaman Tidak Ditemukan", NOT_FOUND),
        }
    }
}

/// Escape text for use in HTML element content and quoted attributes.
#[must_use]
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
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

/// Human-readable timestamp, e.g. `05 Mar 2024 09:30`.
///
/// A stored value that is not a date is shown as written, escaped.
#[must_use]
pub fn format_timestamp(ts: &Timestamp) -> String {
    match ts {
        Timestamp::At(at) => at.format("%d %b %Y %H:%M").to_string(),
        Timestamp::Unparsed(Value::String(text)) => escape(text),
        Timestamp::Unparsed(_) => "-".to_string(),
    }
}

fn layout(title: &str, content: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="id">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{title} | {site}</title>
</head>
<body>
<header>
<h1><a href="/">{site}</a></h1>
<nav><a href="/">Beranda</a> | <a href="/berita">Berita</a> | <a href="/pengaduan">Pengaduan</a></nav>
</header>
<main>
{content}
</main>
<footer><small>&copy; {site}</small></footer>
</body>
</html>
"#,
        title = escape(title),
        site = SITE_NAME,
    )
}

fn news_card(item: &NewsItem) -> String {
    let image = item
        .image_ref
        .as_deref()
        .map(|src| format!(r#"<img src="{}" alt="">"#, escape(src)))
        .unwrap_or_default();
    format!(
        r#"<article class="news-card">{image}<h3><a href="/berita/{slug}">{title}</a></h3><time>{date}</time><p>{excerpt}</p></article>
"#,
        slug = escape(&item.slug),
        title = escape(&item.title),
        date = format_timestamp(&item.created_at),
        excerpt = escape(&item.excerpt(EXCERPT_CHARS)),
    )
}

fn news_cards(news: &[NewsItem]) -> String {
    if news.is_empty() {
        return "<p>Belum ada berita.</p>\n".to_string();
    }
    news.iter().map(news_card).collect()
}

fn home(news: &[NewsItem]) -> String {
    format!(
        r#"<section>
<h2>Berita Terbaru</h2>
{cards}<p><a href="/berita">Semua berita</a></p>
</section>
<section>
<h2>Layanan Pengaduan</h2>
<p>Sampaikan keluhan Anda kepada perangkat desa. <a href="/pengaduan">Buat pengaduan</a></p>
</section>"#,
        cards = news_cards(news),
    )
}

fn news_list(news: &[NewsItem]) -> String {
    format!("<h2>Berita</h2>\n{}", news_cards(news))
}

fn news_detail(item: &NewsItem) -> String {
    let image = item
        .image_ref
        .as_deref()
        .map(|src| format!("<img src=\"{}\" alt=\"{}\">\n", escape(src), escape(&item.title)))
        .unwrap_or_default();
    let paragraphs: String = item
        .body
        .split("\n\n")
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(|p| format!("<p>{}</p>\n", escape(p).replace('\n', "<br>")))
        .collect();
    format!(
        "<article>\n<h2>{title}</h2>\n<time>{date}</time>\n{image}{paragraphs}</article>\n<p><a href=\"/berita\">Kembali ke daftar berita</a></p>",
        title = escape(&item.title),
        date = format_timestamp(&item.created_at),
    )
}

fn complaint_form(error: Option<&str>) -> String {
    let error = error
        .map(|msg| format!("<p class=\"error\" role=\"alert\">{}</p>\n", escape(msg)))
        .unwrap_or_default();
    format!(
        r#"<h2>Form Pengaduan</h2>
{error}<form method="post" action="/pengaduan">
<label>Nama <input type="text" name="name" required></label>
<label>Kontak <input type="text" name="contact"></label>
<label>Kategori <input type="text" name="category" placeholder="General"></label>
<label>Isi pengaduan <textarea name="body" rows="6" required></textarea></label>
<button type="submit">Kirim</button>
</form>"#
    )
}

const COMPLAINT_SUCCESS: &str = r#"<h2>Terima kasih</h2>
<p>Pengaduan Anda telah kami terima dan akan segera ditindaklanjuti.</p>
<p><a href="/">Kembali ke beranda</a></p>"#;

const NOT_FOUND: &str = r#"<h2>404</h2>
<p>Halaman yang Anda cari tidak ditemukan.</p>
<p><a href="/">Kembali ke beranda</a></p>"#;

fn news_row(item: &NewsItem) -> String {
    format!(
        "<tr><td>{date}</td><td><a href=\"/berita/{slug}\">{title}</a></td><td>{slug}</td></tr>\n",
        date = format_timestamp(&item.created_at),
        slug = escape(&item.slug),
        title = escape(&item.title),
    )
}

fn complaint_row(complaint: &Complaint) -> String {
    let updated = complaint
        .updated_at
        .as_ref()
        .map(format_timestamp)
        .unwrap_or_default();
    format!(
        r#"<tr><td>{date}</td><td>{name}</td><td>{contact}</td><td>{category}</td><td>{body}</td><td>{status}</td><td>{updated}</td><td><form method="post" action="/admin/pengaduan/{id}/status"><input type="text" name="status" list="statuses" value="{status}"><button type="submit">Simpan</button></form></td></tr>
"#,
        date = format_timestamp(&complaint.created_at),
        name = escape(&complaint.name),
        contact = escape(complaint.contact.as_deref().unwrap_or("-")),
        category = escape(&complaint.category),
        body = escape(&complaint.body),
        status = escape(&complaint.status),
        id = escape(&complaint.id),
    )
}

fn dashboard(news: &[NewsItem], complaints: &[Complaint]) -> String {
    let news_rows: String = news.iter().map(news_row).collect();
    let complaint_rows: String = complaints.iter().map(complaint_row).collect();
    let status_options: String = SUGGESTED_STATUSES
        .iter()
        .map(|s| format!("<option value=\"{s}\">"))
        .collect();
    format!(
        r#"<h2>Dashboard Admin</h2>
<section>
<h3>Tulis Berita</h3>
<form method="post" action="/admin/berita">
<label>Judul <input type="text" name="title" required></label>
<label>Gambar (URL) <input type="text" name="imageRef"></label>
<label>Isi <textarea name="body" rows="8" required></textarea></label>
<button type="submit">Terbitkan</button>
</form>
</section>
<section>
<h3>Berita ({news_count})</h3>
<table>
<thead><tr><th>Tanggal</th><th>Judul</th><th>Slug</th></tr></thead>
<tbody>
{news_rows}</tbody>
</table>
</section>
<section>
<h3>Pengaduan ({complaint_count})</h3>
<datalist id="statuses">{status_options}</datalist>
<table>
<thead><tr><th>Tanggal</th><th>Nama</th><th>Kontak</th><th>Kategori</th><th>Isi</th><th>Status</th><th>Diperbarui</th><th>Ubah status</th></tr></thead>
<tbody>
{complaint_rows}</tbody>
</table>
</section>"#,
        news_count = news.len(),
        complaint_count = complaints.len(),
    )
}
