//! RSS 2.0 feed generation.

use std::collections::BTreeMap;

use chrono::{DateTime, TimeZone, Utc};
use rss::extension::atom::{AtomExtension, Link};
use rss::{Category, Channel, Guid, Item};

use kiji_content::PostMeta;

use crate::config::SiteConfig;

/// Newest posts included in the feed.
pub const FEED_ITEM_LIMIT: usize = 20;

const ATOM_NAMESPACE: &str = "http://www.w3.org/2005/Atom";

/// Build the feed for `posts`, which must already be newest first.
///
/// `self_path` is where the feed itself is served, e.g. `/api/rss`.
pub fn build_rss(site: &SiteConfig, posts: &[PostMeta], self_path: &str, now: DateTime<Utc>) -> String {
    let items: Vec<Item> = posts
        .iter()
        .take(FEED_ITEM_LIMIT)
        .map(|meta| feed_item(site, meta))
        .collect();

    let mut self_link = Link::default();
    self_link.set_href(site.absolute_url(self_path));
    self_link.set_rel("self");
    self_link.set_mime_type(Some("application/rss+xml".to_string()));

    let mut atom = AtomExtension::default();
    atom.set_links(vec![self_link]);

    let mut channel = Channel::default();
    channel.set_namespaces(BTreeMap::from([("atom".to_string(), ATOM_NAMESPACE.to_string())]));
    channel.set_title(site.title.clone());
    channel.set_link(site.base_url.trim_end_matches('/').to_string());
    channel.set_description(site.description.clone());
    channel.set_language(Some(site.language.clone()));
    channel.set_last_build_date(Some(now.to_rfc2822()));
    channel.set_atom_ext(Some(atom));
    channel.set_items(items);

    channel.to_string()
}

fn feed_item(site: &SiteConfig, meta: &PostMeta) -> Item {
    let url = site.absolute_url(&site.post_path(meta));

    let mut item = Item::default();
    item.set_title(Some(meta.title.clone()));
    item.set_link(Some(url.clone()));
    item.set_guid(Some(Guid {
        value: url,
        permalink: true,
    }));
    item.set_description(Some(meta.description.clone()));
    item.set_pub_date(Some(Utc.from_utc_datetime(&meta.created).to_rfc2822()));

    let categories: Vec<Category> = meta
        .tags
        .iter()
        .map(|tag| {
            let mut category = Category::default();
            category.set_name(tag.clone());
            category
        })
        .collect();
    item.set_categories(categories);

    item
}
