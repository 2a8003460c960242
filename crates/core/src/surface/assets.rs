//! Asset URL repair.
//!
//! Proxied markup arrives with its references partially rewritten; anything
//! the pre-sanitizer missed (lazily inserted nodes, framework-built srcsets,
//! inline `url(...)` backgrounds) still points at the original origin or at
//! a relative path that no longer resolves. Repair walks the affected
//! attributes, resolves every relative reference against the recovered
//! original base URL, and routes it through the proxy.
//!
//! Repair is defined-safe to re-run: already-proxied references are left
//! untouched, so the staggered passes and the structural-change watch can
//! fire as often as they like.

use restyle_protocol::SurfaceHandle;
use url::Url;

/// Path prefix of the resource proxy endpoint.
pub const PROXY_PATH: &str = "/api/proxy-path/";

/// Placeholder the fetch collaborator leaves where the proxy origin goes.
pub const PROXY_BASE_TOKEN: &str = "{{PROXY_BASE}}";

/// Schemes and pseudo-references that must never be rewritten.
const SKIP_PREFIXES: &[&str] = &["data:", "blob:", "#", "javascript:", "mailto:", "tel:"];

/// Substitute the proxy-base placeholder throughout delivered markup.
pub fn substitute_proxy_base(html: &str, proxy_base: &str) -> String {
    html.replace(PROXY_BASE_TOKEN, proxy_base)
}

fn proxied(absolute: &str, proxy_base: &str) -> String {
    format!("{proxy_base}{PROXY_PATH}{absolute}")
}

fn already_proxied(raw: &str) -> bool {
    raw.contains(PROXY_PATH) || raw.starts_with(PROXY_BASE_TOKEN)
}

/// Compute the proxy-routed replacement for one reference.
///
/// Returns `None` when the reference must be left untouched: special
/// schemes, already-proxied values, and references that fail to resolve
/// (a malformed URL skips that single reference, never the whole pass).
pub fn repair_reference(raw: &str, base: &Url, proxy_base: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() || already_proxied(raw) {
        return None;
    }
    if SKIP_PREFIXES.iter().any(|p| raw.starts_with(p)) {
        return None;
    }
    // Protocol-relative references adopt the base scheme before proxying.
    if let Some(rest) = raw.strip_prefix("//") {
        return Some(proxied(&format!("{}://{}", base.scheme(), rest), proxy_base));
    }
    if raw.starts_with("http://") || raw.starts_with("https://") {
        return Some(proxied(raw, proxy_base));
    }
    match base.join(raw) {
        Ok(joined) => Some(proxied(joined.as_str(), proxy_base)),
        Err(err) => {
            tracing::debug!(reference = raw, %err, "skipping malformed asset reference");
            None
        }
    }
}

/// Rewrite a `srcset` list, one `url descriptor` entry at a time.
///
/// Returns `None` when no entry needed repair.
pub fn rewrite_srcset(srcset: &str, base: &Url, proxy_base: &str) -> Option<String> {
    let mut changed = false;
    let entries: Vec<String> = srcset
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            let (url_part, descriptor) = match entry.rsplit_once(char::is_whitespace) {
                Some((u, d)) => (u.trim(), Some(d.trim())),
                None => (entry, None),
            };
            let repaired = match repair_reference(url_part, base, proxy_base) {
                Some(r) => {
                    changed = true;
                    r
                }
                None => url_part.to_owned(),
            };
            match descriptor {
                Some(d) => format!("{repaired} {d}"),
                None => repaired,
            }
        })
        .collect();
    changed.then(|| entries.join(", "))
}

/// Rewrite `url(...)` occurrences inside an inline style attribute.
///
/// Returns `None` when nothing needed repair.
pub fn rewrite_style_urls(style: &str, base: &Url, proxy_base: &str) -> Option<String> {
    let mut out = String::with_capacity(style.len());
    let mut rest = style;
    let mut changed = false;

    while let Some(open) = rest.find("url(") {
        let Some(close) = rest[open..].find(')') else {
            break;
        };
        out.push_str(&rest[..open]);
        let inner = rest[open + 4..open + close].trim().trim_matches(['\'', '"']);
        match repair_reference(inner, base, proxy_base) {
            Some(repaired) => {
                changed = true;
                out.push_str("url('");
                out.push_str(&repaired);
                out.push_str("')");
            }
            None => out.push_str(&rest[open..=open + close]),
        }
        rest = &rest[open + close + 1..];
    }
    out.push_str(rest);
    changed.then_some(out)
}

/// Make an anchor target absolute without routing it through the proxy —
/// navigation targets keep pointing at the original site.
pub fn absolutize_link(raw: &str, base: &Url) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() || already_proxied(raw) {
        return None;
    }
    if SKIP_PREFIXES.iter().any(|p| raw.starts_with(p)) {
        return None;
    }
    if raw.starts_with("http://") || raw.starts_with("https://") || raw.starts_with("//") {
        return None;
    }
    base.join(raw).ok().map(String::from)
}

/// One repair pass over every reference-carrying attribute of a surface.
///
/// Returns the number of references rewritten.
pub fn repair_surface<H: SurfaceHandle>(handle: &mut H, base: &Url, proxy_base: &str) -> usize {
    let mut fixed = 0;

    for node in handle.query_all("img[src], source[src], video[src], audio[src], script[src]") {
        if let Some(src) = handle.attribute(node, "src")
            && let Some(repaired) = repair_reference(&src, base, proxy_base)
        {
            handle.set_attribute(node, "src", &repaired);
            fixed += 1;
        }
    }

    for node in handle.query_all("link[href]") {
        let rel = handle.attribute(node, "rel").unwrap_or_default();
        if !rel.to_ascii_lowercase().contains("stylesheet") {
            continue;
        }
        if let Some(href) = handle.attribute(node, "href")
            && let Some(repaired) = repair_reference(&href, base, proxy_base)
        {
            handle.set_attribute(node, "href", &repaired);
            fixed += 1;
        }
    }

    for node in handle.query_all("[srcset]") {
        if let Some(srcset) = handle.attribute(node, "srcset")
            && let Some(repaired) = rewrite_srcset(&srcset, base, proxy_base)
        {
            handle.set_attribute(node, "srcset", &repaired);
            fixed += 1;
        }
    }

    for node in handle.query_all("a[href]") {
        if let Some(href) = handle.attribute(node, "href")
            && let Some(absolute) = absolutize_link(&href, base)
        {
            handle.set_attribute(node, "href", &absolute);
            fixed += 1;
        }
    }

    for node in handle.query_all("[style]") {
        if let Some(style) = handle.attribute(node, "style")
            && let Some(repaired) = rewrite_style_urls(&style, base, proxy_base)
        {
            handle.set_attribute(node, "style", &repaired);
            fixed += 1;
        }
    }

    if fixed > 0 {
        tracing::debug!(fixed, "asset repair pass rewrote references");
    }
    fixed
}
