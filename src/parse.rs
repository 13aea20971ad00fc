use scraper::{ElementRef, Html, Selector};
use tracing::debug;
use url::Url;
use uuid::Uuid;

use crate::model::{Identity, Section, SubmissionStub};
use crate::{Error, Result};

/// Stubs of one listing page, in page order.
pub type Stubs = std::vec::IntoIter<SubmissionStub>;

const VIEW_SEGMENT: &str = "view";
const HANDLE_MARKERS: [&str; 3] = ["user", "gallery", "scraps"];

/// Tries, in order: the profile anchor in the page, `fallback_handle`, a handle parsed out of
/// `fallback_url`. Returns `None` only if all three come up empty.
pub fn extract_identity(
    body: &str,
    fallback_handle: Option<&str>,
    fallback_url: Option<&str>,
) -> Result<Option<Identity>> {
    let doc = Html::parse_document(body);
    let anchor_selector = create_selector(r#"#userpage-nav a[href*="/user/"]"#)?;

    if let Some(anchor) = doc.select(&anchor_selector).next() {
        let text = element_text(anchor);
        if let Some(identity) = Identity::new(&text, Some(text.clone())) {
            debug!(handle = %identity.handle, "handle parsed from page");
            return Ok(Some(identity));
        }
    }

    if let Some(identity) = fallback_handle.and_then(|h| Identity::new(h, None)) {
        debug!(handle = %identity.handle, "handle taken from input");
        return Ok(Some(identity));
    }

    if let Some(identity) = fallback_url
        .and_then(handle_from_url)
        .and_then(|h| Identity::new(&h, None))
    {
        debug!(handle = %identity.handle, "handle parsed from url");
        return Ok(Some(identity));
    }

    debug!("couldn't derive a handle by any method");
    Ok(None)
}

/// Takes the segment following `user` (or `gallery` / `scraps`) in a URL, lowercased.
pub fn handle_from_url(url: &str) -> Option<String> {
    let path = url.split(['?', '#']).next().unwrap_or_default();
    let mut segments = path.split('/').filter(|s| !s.is_empty());
    segments.find(|s| HANDLE_MARKERS.contains(s))?;
    segments
        .next()
        .map(str::to_lowercase)
        .filter(|h| !h.trim().is_empty())
}

/// A handle typed by the user, or a handle buried in a pasted URL.
pub fn target_handle(input: &str) -> Option<String> {
    let input = input.trim();
    if input.starts_with("http") {
        return handle_from_url(input);
    }
    Some(input.to_lowercase()).filter(|h| !h.is_empty())
}

/// Parses every gallery figure on a listing page into a stub.
/// Figures without a detail link are dropped; broken markup yields no stubs.
pub fn extract_stubs(
    body: &str,
    identity: &Identity,
    base: &Url,
    section: Section,
) -> Result<Stubs> {
    let doc = Html::parse_document(body);

    let figure_selector = create_selector(r#"figure[class*="t-image"]"#)?;
    let link_selector = create_selector(r#"a[href*="/view/"]"#)?;
    let caption_selector = create_selector("figcaption")?;
    let caption_line_selector = create_selector("p")?;
    let img_selector = create_selector("img")?;

    // A gallery page holds up to 72 figures.
    let mut stubs = Vec::with_capacity(72);
    for figure in doc.select(&figure_selector) {
        let Some(href) = figure
            .select(&link_selector)
            .filter_map(|a| a.value().attr("href"))
            .map(str::trim)
            .find(|href| !href.is_empty())
        else {
            continue;
        };
        let Some(listing_url) = normalize_link(base, href) else {
            continue;
        };
        let id = submission_id(href);

        let caption = figure.select(&caption_selector).next().map(|caption| {
            caption
                .select(&caption_line_selector)
                .next()
                .map_or_else(|| element_text(caption), element_text)
        });
        let img = figure.select(&img_selector).next();
        let display_name = caption
            .into_iter()
            .chain(img.and_then(|i| i.value().attr("alt")).map(str::to_string))
            .chain(img.and_then(|i| i.value().attr("title")).map(str::to_string))
            .map(|s| s.trim().to_string())
            .find(|s| !s.is_empty())
            .unwrap_or_else(|| id.clone());

        stubs.push(SubmissionStub {
            id,
            title: display_name.clone(),
            owner_handle: identity.handle.clone(),
            owner_account_name: identity.account_name.clone(),
            listing_url,
            display_name,
            is_secondary: section.is_secondary(),
            uploaded_at: None,
        });
    }
    Ok(stubs.into_iter())
}

/// Finds the "next page" link of a listing page, resolved against `current`.
/// Looks at `rel="next"` anchors, then anchors labelled "Next", then "Next" form buttons.
pub fn next_page_link(body: &str, current: &Url) -> Result<Option<String>> {
    let doc = Html::parse_document(body);

    let rel_selector = create_selector(r#"a[rel~="next"][href]"#)?;
    let anchor_selector = create_selector("a[href]")?;
    let form_selector = create_selector("form[action]")?;
    let button_selector = create_selector(r#"button, input[type="submit"]"#)?;

    let rel_next = doc
        .select(&rel_selector)
        .filter_map(|a| a.value().attr("href"));
    let labelled_next = doc
        .select(&anchor_selector)
        .filter(|a| is_next_label(&element_text(*a)))
        .filter_map(|a| a.value().attr("href"));
    let form_next = doc
        .select(&form_selector)
        .filter(|form| {
            form.select(&button_selector).any(|button| {
                is_next_label(&element_text(button))
                    || button.value().attr("value").is_some_and(is_next_label)
            })
        })
        .filter_map(|form| form.value().attr("action"));

    Ok(rel_next
        .chain(labelled_next)
        .chain(form_next)
        .find_map(|href| normalize_link(current, href)))
}

/// Makes an href absolute. Root-relative and protocol-relative links resolve against `base`.
pub fn normalize_link(base: &Url, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() || href.starts_with('#') || href.starts_with("javascript:") {
        return None;
    }
    base.join(href).ok().map(Into::into)
}

#[inline]
pub(crate) fn create_selector(sel_str: &str) -> Result<Selector> {
    Selector::parse(sel_str).map_err(|_| Error::ParseMissingSelector(sel_str.into()))
}

/// Text content with whitespace runs collapsed.
pub(crate) fn element_text(el: ElementRef) -> String {
    let raw: String = el.text().collect();
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn is_next_label(label: &str) -> bool {
    label.trim().to_lowercase().starts_with("next")
}

/// `/view/12345678/` -> `12345678`. Hrefs with nothing after the view segment get a generated id.
fn submission_id(href: &str) -> String {
    let path = href.split(['?', '#']).next().unwrap_or_default();
    path.split('/')
        .skip_while(|seg| *seg != VIEW_SEGMENT)
        .skip(1)
        .filter(|seg| !seg.is_empty())
        .last()
        .map(str::to_string)
        .unwrap_or_else(|| format!("gen-{}", Uuid::new_v4().simple()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://www.furaffinity.net").unwrap()
    }

    fn artist() -> Identity {
        Identity::new("artist", None).unwrap()
    }

    const LISTING: &str = r#"
        <html><body>
        <section id="gallery-0" class="gallery">
          <figure id="sid-111" class="r-general t-image">
            <b><u><a href="/view/111/"><img alt="Alt one" src="//t.furaffinity.net/111@200.jpg"></a></u></b>
            <figcaption><p><a href="/view/111/" title="First piece">First   piece</a></p><p><i>by</i> <a href="/user/artist/">Artist</a></p></figcaption>
          </figure>
          <figure id="sid-222" class="r-adult t-image">
            <b><u><a href="https://www.furaffinity.net/view/222/"><img alt="Second piece" src="x.jpg"></a></u></b>
          </figure>
          <figure id="sid-333" class="r-general t-image">
            <b><u><img alt="no link here" src="y.jpg"></u></b>
            <figcaption><p>Orphan</p></figcaption>
          </figure>
        </section>
        </body></html>
    "#;

    #[test]
    fn stubs_skip_entries_without_detail_link() {
        let stubs: Vec<_> = extract_stubs(LISTING, &artist(), &base(), Section::Gallery)
            .unwrap()
            .collect();
        assert_eq!(stubs.len(), 2);

        assert_eq!(stubs[0].id, "111");
        assert_eq!(stubs[0].display_name, "First piece");
        assert_eq!(stubs[0].listing_url, "https://www.furaffinity.net/view/111/");
        assert_eq!(stubs[0].owner_handle, "artist");
        assert!(!stubs[0].is_secondary);

        assert_eq!(stubs[1].id, "222");
        assert_eq!(stubs[1].display_name, "Second piece");
    }

    #[test]
    fn scraps_are_flagged_secondary() {
        let stubs: Vec<_> = extract_stubs(LISTING, &artist(), &base(), Section::Scraps)
            .unwrap()
            .collect();
        assert!(stubs.iter().all(|s| s.is_secondary));
    }

    #[test]
    fn display_name_falls_back_to_id() {
        let body = r#"<figure class="t-image"><a href="/view/999/"></a></figure>"#;
        let stub = extract_stubs(body, &artist(), &base(), Section::Gallery)
            .unwrap()
            .next()
            .unwrap();
        assert_eq!(stub.display_name, "999");
    }

    #[test]
    fn bare_view_link_gets_generated_id() {
        let body = r#"
            <figure class="t-image"><a href="/view/"></a></figure>
            <figure class="t-image"><a href="/view/"></a></figure>"#;
        let stubs: Vec<_> = extract_stubs(body, &artist(), &base(), Section::Gallery)
            .unwrap()
            .collect();
        assert_eq!(stubs.len(), 2);
        assert!(stubs[0].id.starts_with("gen-"));
        assert_ne!(stubs[0].id, stubs[1].id);
    }

    #[test]
    fn malformed_markup_yields_nothing() {
        let stubs = extract_stubs("<figure><div", &artist(), &base(), Section::Gallery).unwrap();
        assert_eq!(stubs.count(), 0);
        assert_eq!(
            extract_stubs("", &artist(), &base(), Section::Gallery)
                .unwrap()
                .count(),
            0
        );
    }

    #[test]
    fn identity_from_profile_anchor() {
        let body = r#"<section id="userpage-nav"><a href="/user/someartist/"> SomeArtist </a></section>"#;
        let identity = extract_identity(body, Some("ignored"), None).unwrap().unwrap();
        assert_eq!(identity.handle, "someartist");
        assert_eq!(identity.account_name.as_deref(), Some("SomeArtist"));
    }

    #[test]
    fn lowercase_display_name_is_kept() {
        let body = r#"<section id="userpage-nav"><a href="/user/quiet/">quiet</a></section>"#;
        let identity = extract_identity(body, None, None).unwrap().unwrap();
        assert_eq!(identity.handle, "quiet");
        assert_eq!(identity.account_name.as_deref(), Some("quiet"));
    }

    #[test]
    fn identity_falls_back_to_input_handle() {
        for handle in ["Artist", "UPPER", "mixed_Case-1", "x"] {
            let identity = extract_identity("<html></html>", Some(handle), None)
                .unwrap()
                .unwrap();
            assert_eq!(identity.handle, handle.to_lowercase());
            assert_eq!(identity.account_name, None);
        }
    }

    #[test]
    fn identity_falls_back_to_url() {
        let identity = extract_identity(
            "<html></html>",
            None,
            Some("https://www.furaffinity.net/user/FromUrl/"),
        )
        .unwrap()
        .unwrap();
        assert_eq!(identity.handle, "fromurl");
    }

    #[test]
    fn identity_none_when_everything_fails() {
        let none = extract_identity("<html></html>", Some("  "), Some("https://example.com/"))
            .unwrap();
        assert!(none.is_none());
    }

    #[test]
    fn handles_from_urls_and_input() {
        assert_eq!(
            handle_from_url("https://www.furaffinity.net/gallery/Artist/2/?x=1").as_deref(),
            Some("artist")
        );
        assert_eq!(handle_from_url("https://www.furaffinity.net/user/"), None);
        assert_eq!(target_handle("  Artist "), Some("artist".to_string()));
        assert_eq!(
            target_handle("https://www.furaffinity.net/scraps/artist/").as_deref(),
            Some("artist")
        );
        assert_eq!(target_handle("   "), None);
    }

    #[test]
    fn next_link_from_anchor_or_form() {
        let current = Url::parse("https://www.furaffinity.net/gallery/artist/").unwrap();

        let anchor = r#"<a class="button" href="/gallery/artist/2/">Next</a>"#;
        assert_eq!(
            next_page_link(anchor, &current).unwrap().as_deref(),
            Some("https://www.furaffinity.net/gallery/artist/2/")
        );

        let form = r#"<form action="/gallery/artist/3/" method="get"><button type="submit">Next 48</button></form>"#;
        assert_eq!(
            next_page_link(form, &current).unwrap().as_deref(),
            Some("https://www.furaffinity.net/gallery/artist/3/")
        );

        let last = r#"<a href="/gallery/artist/1/">Prev</a><a href="">Next</a>"#;
        assert_eq!(next_page_link(last, &current).unwrap(), None);
    }

    #[test]
    fn links_are_made_absolute() {
        let b = base();
        assert_eq!(
            normalize_link(&b, "/view/1/").as_deref(),
            Some("https://www.furaffinity.net/view/1/")
        );
        assert_eq!(
            normalize_link(&b, "//d.furaffinity.net/art/a/1.png").as_deref(),
            Some("https://d.furaffinity.net/art/a/1.png")
        );
        assert_eq!(
            normalize_link(&b, "http://other.example/view/2/").as_deref(),
            Some("http://other.example/view/2/")
        );
        assert_eq!(normalize_link(&b, "  "), None);
    }
}
