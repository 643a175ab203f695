//! Outbound links: video and blog searches, companion sites, and keyword
//! matched shop recommendations.

use crate::{GlossaryRecord, ToolLink};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

/// Everything except `A-Z a-z 0-9 - _ . ! ~ * ' ( )` is escaped.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

pub const BLOG_URL: &str = "https://bakinggreatbread.blog";
pub const STARTER_GUIDE_URL: &str = "https://sourdough-starter-master-kxo6qxb.gamma.site/";
pub const BOOK_URL: &str = "https://sourdough-simplified-gift.lovable.app/sourdough-for-the-rest";
pub const COMMUNITY_URL: &str = "https://www.facebook.com/groups/1082865755403754";

struct ProductMapping {
    keywords: &'static [&'static str],
    name: &'static str,
    url: &'static str,
}

const PRODUCT_MAPPINGS: &[ProductMapping] = &[
    ProductMapping {
        keywords: &["bench knife", "bench scraper", "bench-scraper", "dough scraper"],
        name: "Brød & Taylor Bench Knife",
        url: "https://collabs.shop/i4ifmu",
    },
    ProductMapping {
        keywords: &["banneton", "proofing basket", "proofing container", "brotform"],
        name: "Brød & Taylor Proofing Container",
        url: "https://collabs.shop/6iguo3",
    },
    ProductMapping {
        keywords: &["lame", "scoring", "bread lame", "score", "slash"],
        name: "Wire Monkey Lame",
        url: "https://wiremonkey.com/?ref=BAKINGGREATBREAD",
    },
    ProductMapping {
        keywords: &["dutch oven", "baking vessel", "combo cooker", "lodge"],
        name: "Brød & Taylor Baking Shell (Boule)",
        url: "https://collabs.shop/yfjaxt",
    },
    ProductMapping {
        keywords: &["batard", "oval loaf", "oblong"],
        name: "Brød & Taylor Baking Shell (Batard)",
        url: "https://collabs.shop/8su3wv",
    },
    ProductMapping {
        keywords: &["baking steel", "pizza steel", "bread steel", "steel plate"],
        name: "Brød & Taylor Bread Steel",
        url: "https://collabs.shop/soze7p",
    },
    ProductMapping {
        keywords: &["scale", "kitchen scale", "digital scale", "weighing"],
        name: "Brød & Taylor Scale",
        url: "https://collabs.shop/bsdfl2",
    },
    ProductMapping {
        keywords: &["proofing", "proof", "proofer", "folding proofer", "proofing box"],
        name: "Brød & Taylor Folding Proofer",
        url: "https://collabs.shop/38ff48",
    },
    ProductMapping {
        keywords: &["sourdough starter", "levain", "starter", "mother dough", "wild yeast"],
        name: "Sourhouse Goldie",
        url: "https://bit.ly/3Wd9rJy",
    },
];

pub fn encode_component(value: &str) -> String {
    utf8_percent_encode(value, COMPONENT).to_string()
}

/// Video search for a record, preferring its curated query over the term.
pub fn youtube_search_url(record: &GlossaryRecord) -> String {
    let query = record
        .youtube_query
        .as_deref()
        .filter(|query| !query.is_empty())
        .unwrap_or(&record.term);
    format!(
        "https://www.youtube.com/results?search_query=bread+baking+{}",
        encode_component(query)
    )
}

pub fn blog_search_url(term: &str) -> String {
    format!("{BLOG_URL}/?s={}", encode_component(term))
}

/// Products whose keywords appear in the record's id, term or definition.
pub fn matched_products(record: &GlossaryRecord) -> Vec<ToolLink> {
    let haystack = format!("{} {} {}", record.id, record.term, record.definition).to_lowercase();
    let mut products: Vec<ToolLink> = Vec::new();
    for mapping in PRODUCT_MAPPINGS {
        let hit = mapping
            .keywords
            .iter()
            .any(|keyword| haystack.contains(keyword));
        if hit && !products.iter().any(|product| product.url == mapping.url) {
            products.push(ToolLink {
                name: mapping.name.to_string(),
                url: mapping.url.to_string(),
            });
        }
    }
    products
}

/// The record's curated tools followed by matched products with new URLs.
pub fn shop_links(record: &GlossaryRecord) -> Vec<ToolLink> {
    let mut links = record.affiliate_tools.clone();
    for product in matched_products(record) {
        if !links.iter().any(|existing| existing.url == product.url) {
            links.push(product);
        }
    }
    links
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::record;

    #[test]
    fn youtube_url_prefers_curated_query() {
        let mut pate = record("pate-fermentee", "Pâte Fermentée", "Ingredient", "Advanced");
        assert_eq!(
            youtube_search_url(&pate),
            "https://www.youtube.com/results?search_query=bread+baking+P%C3%A2te%20Ferment%C3%A9e"
        );
        pate.youtube_query = Some("old dough pre-ferment".to_string());
        assert_eq!(
            youtube_search_url(&pate),
            "https://www.youtube.com/results?search_query=bread+baking+old%20dough%20pre-ferment"
        );
    }

    #[test]
    fn blog_search_escapes_reserved_characters() {
        assert_eq!(
            blog_search_url("Baker's % & more"),
            "https://bakinggreatbread.blog/?s=Baker's%20%25%20%26%20more"
        );
    }

    #[test]
    fn products_match_keywords_once_per_url() {
        let mut lame = record("lame", "Lame", "Tool", "Beginner");
        lame.definition = "A blade used for scoring and to slash the loaf.".to_string();
        let products = matched_products(&lame);
        assert_eq!(products.len(), 1);
        assert_eq!(products[0].name, "Wire Monkey Lame");
    }

    #[test]
    fn shop_links_keep_curated_tools_first() {
        let mut banneton = record("banneton", "Banneton", "Tool", "Beginner");
        banneton.affiliate_tools = vec![ToolLink {
            name: "Proofing Container 6L".to_string(),
            url: "https://collabs.shop/6iguo3".to_string(),
        }];
        let links = shop_links(&banneton);
        assert_eq!(links[0].name, "Proofing Container 6L");
        assert_eq!(
            links
                .iter()
                .filter(|link| link.url == "https://collabs.shop/6iguo3")
                .count(),
            1
        );
    }
}
