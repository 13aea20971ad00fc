//! Detail page resolution: the full-size asset behind a listing stub.

use chrono::{DateTime, NaiveDateTime, Utc};
use scraper::Html;
use url::Url;

use crate::model::ResolvedAsset;
use crate::parse::{create_selector, element_text, normalize_link};
use crate::Result;

const DATE_FORMATS: [&str; 2] = ["%b %d, %Y %I:%M %p", "%B %d, %Y %I:%M %p"];

/// Finds the download link (or the full-view image) on a detail page.
/// `Ok(None)` means the page has no media we can download.
pub fn resolve(body: &str, base: &Url) -> Result<Option<ResolvedAsset>> {
    let doc = Html::parse_document(body);

    let download_selector = create_selector(".download a[href]")?;
    let image_selector = create_selector("img#submissionImg")?;
    let og_image_selector = create_selector(r#"meta[property="og:image"]"#)?;
    let title_selector = create_selector(".submission-title h2, .submission-title")?;
    let og_title_selector = create_selector(r#"meta[property="og:title"]"#)?;
    let date_selector = create_selector("span.popup_date")?;

    let download_anchor = doc.select(&download_selector).next();
    let download_href = download_anchor.and_then(|a| a.value().attr("href"));
    let image_src = doc.select(&image_selector).next().and_then(|img| {
        img.value()
            .attr("data-fullview-src")
            .or_else(|| img.value().attr("src"))
    });
    let og_image = doc
        .select(&og_image_selector)
        .next()
        .and_then(|meta| meta.value().attr("content"));

    let Some(asset_url) = [download_href, image_src, og_image]
        .into_iter()
        .flatten()
        .find_map(|href| normalize_link(base, href))
    else {
        return Ok(None);
    };

    let real_filename = download_anchor
        .and_then(|a| a.value().attr("download"))
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .or_else(|| filename_from_url(&asset_url));
    let Some(real_filename) = real_filename else {
        return Ok(None);
    };

    let title = doc
        .select(&title_selector)
        .map(element_text)
        .chain(
            doc.select(&og_title_selector)
                .filter_map(|meta| meta.value().attr("content"))
                .map(str::to_string),
        )
        .find(|t| !t.trim().is_empty());

    let uploaded_at = doc.select(&date_selector).find_map(|span| {
        span.value()
            .attr("title")
            .and_then(parse_upload_date)
            .or_else(|| parse_upload_date(&element_text(span)))
    });

    Ok(Some(ResolvedAsset {
        asset_url,
        real_filename,
        title,
        uploaded_at,
    }))
}

/// Last path segment of the URL, percent-decoded.
pub fn filename_from_url(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let segment = parsed.path_segments()?.filter(|s| !s.is_empty()).last()?;
    let decoded = urlencoding::decode(segment)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| segment.to_string());
    Some(decoded).filter(|s| s != "." && s != "..")
}

/// Parses dates like `Jan 5th, 2023 08:15 PM` or an RFC 3339 timestamp.
pub fn parse_upload_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    let cleaned = strip_ordinal_suffixes(raw);
    DATE_FORMATS.iter().find_map(|fmt| {
        NaiveDateTime::parse_from_str(&cleaned, fmt)
            .ok()
            .map(|naive| naive.and_utc())
    })
}

// "5th," -> "5,"
fn strip_ordinal_suffixes(s: &str) -> String {
    s.split_whitespace()
        .map(|word| {
            let (head, comma) = match word.strip_suffix(',') {
                Some(head) => (head, ","),
                None => (word, ""),
            };
            for suffix in ["st", "nd", "rd", "th"] {
                if let Some(num) = head.strip_suffix(suffix) {
                    if !num.is_empty() && num.chars().all(|c| c.is_ascii_digit()) {
                        return format!("{num}{comma}");
                    }
                }
            }
            word.to_string()
        })
        .collect::<Vec<_>>()
        .join(" ")
}
