//! Inline `<tag>` substitution in lines and response text.

use pv_core::{ItemType, Role, Talker};

use crate::dialogue::Dialogue;

const PUNCTUATION: [&str; 3] = [".", "…", "!"];

/// Replace every `<tag>` in `phrase`.
///
/// Replacement text is never scanned again, so tags produced by a
/// substitution stay as they are. Unknown tags become `????`.
pub fn parse_tags(d: &Dialogue<'_>, phrase: &str) -> String {
    let mut out = String::with_capacity(phrase.len());
    let mut rest = phrase;
    while let Some(start) = rest.find('<') {
        let Some(len) = rest[start..].find('>') else {
            break;
        };
        let end = start + len;
        out.push_str(&rest[..start]);
        out.push_str(&replacement(d, &rest[start + 1..end]));
        rest = &rest[end + 1..];
    }
    out.push_str(rest);
    out
}

/// Format a price in cents.
pub fn format_money(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let cents = cents.unsigned_abs();
    format!("{sign}${}.{:02}", cents / 100, cents % 100)
}

fn weapon_or_fists(talker: &dyn Talker) -> String {
    talker.weapon_name().unwrap_or_else(|| "fists".to_string())
}

fn topic_item(d: &Dialogue<'_>) -> Option<ItemType> {
    let id = d.current_item()?;
    Some(
        d.world()
            .item_type(id)
            .unwrap_or_else(|| ItemType::new(id, id, 0)),
    )
}

fn replacement(d: &Dialogue<'_>, tag: &str) -> String {
    match tag {
        "yrwp" => weapon_or_fists(d.actor(Role::Alpha)),
        "mywp" => weapon_or_fists(d.actor(Role::Beta)),
        "ammo" => d
            .actor(Role::Beta)
            .ammo_name()
            .unwrap_or_else(|| "BADAMMO".to_string()),
        "current_activity" => d
            .actor(Role::Beta)
            .activity()
            .unwrap_or_else(|| "doing this and that".to_string()),
        "punc" => d
            .random_index(PUNCTUATION.len())
            .map_or(".", |i| PUNCTUATION[i])
            .to_string(),
        "mypronoun" => d.actor(Role::Beta).gender().pronoun().to_string(),
        "topic_item" | "topic_item_price" | "topic_item_my_total_price"
        | "topic_item_your_total_price" => match topic_item(d) {
            Some(item) => item_tag(d, tag, &item),
            None => {
                tracing::debug!(tag, "item tag outside an item topic");
                "????".to_string()
            }
        },
        category if d.registry().has_snippet_category(category) => {
            let pool = d.registry().snippets(category);
            d.random_index(pool.len())
                .map(|i| pool[i].text.clone())
                .unwrap_or_default()
        }
        unknown => {
            tracing::debug!(tag = unknown, "unknown text tag");
            "????".to_string()
        }
    }
}

fn item_tag(d: &Dialogue<'_>, tag: &str, item: &ItemType) -> String {
    match tag {
        "topic_item" => item.name.clone(),
        "topic_item_price" => format_money(item.price),
        "topic_item_my_total_price" => {
            format_money(item.price.saturating_mul(d.actor(Role::Beta).charges_of(&item.id)))
        }
        _ => format_money(item.price.saturating_mul(d.actor(Role::Alpha).charges_of(&item.id))),
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use pv_core::{Gender, Item};

    use super::*;
    use crate::registry::{Snippet, TopicRegistry};
    use crate::test_support::Fixture;

    #[test]
    fn weapons_fall_back_to_fists() {
        let mut fx = Fixture::new();
        fx.alpha.weapon = Some("crowbar".into());
        let d = fx.dialogue();
        assert_eq!(
            parse_tags(&d, "Drop that <yrwp> or taste my <mywp>."),
            "Drop that crowbar or taste my fists."
        );
    }

    #[test]
    fn missing_state_has_placeholders() {
        let mut fx = Fixture::new();
        fx.beta.gender = Gender::Female;
        let d = fx.dialogue();
        assert_eq!(
            parse_tags(&d, "<mypronoun> is <current_activity> with <ammo>"),
            "She is doing this and that with BADAMMO"
        );
    }

    #[test]
    fn unknown_tags_are_marked() {
        let mut fx = Fixture::new();
        let d = fx.dialogue();
        assert_eq!(parse_tags(&d, "Hey <nope>!"), "Hey ????!");
        assert_eq!(parse_tags(&d, "a <b"), "a <b");
    }

    #[test]
    fn punctuation_is_one_of_three() {
        let mut fx = Fixture::new();
        let d = fx.dialogue();
        let out = parse_tags(&d, "Hi<punc>");
        assert!(PUNCTUATION.iter().any(|p| out == format!("Hi{p}")));
    }

    #[test]
    fn item_prices_use_the_topic_item() {
        let mut fx = Fixture::new();
        fx.world = fx
            .world
            .with_item_type(ItemType::new("bandages", "bandage", 250));
        fx.beta.inventory = vec![Item::new("bandages"), Item::new("bandages")];
        let mut d = fx.dialogue();
        d.cur_item = Some("bandages".into());
        assert_eq!(
            parse_tags(&d, "<topic_item> for <topic_item_price>, all for <topic_item_my_total_price>"),
            "bandage for $2.50, all for $5.00"
        );
        assert_eq!(parse_tags(&d, "<topic_item_your_total_price>"), "$0.00");
        d.cur_item = None;
        assert_eq!(parse_tags(&d, "<topic_item>"), "????");
    }

    #[test]
    fn total_prices_saturate() {
        let mut fx = Fixture::new();
        fx.world = fx.world.with_item_type(ItemType::new("gold", "gold bar", i64::MAX));
        fx.alpha.inventory = vec![Item::new("gold"), Item::new("gold")];
        let mut d = fx.dialogue();
        d.cur_item = Some("gold".into());
        assert_eq!(
            parse_tags(&d, "<topic_item_your_total_price>"),
            "$92233720368547758.07"
        );
    }

    #[test]
    fn snippet_categories_are_tags() {
        let mut registry = TopicRegistry::new();
        registry.insert_snippet("greet", Snippet::new("g1", "Howdy"));
        let mut fx = Fixture::with_registry(registry);
        let d = fx.dialogue();
        assert_eq!(parse_tags(&d, "<greet>, stranger."), "Howdy, stranger.");
    }

    #[test]
    fn replacements_are_not_rescanned() {
        let mut registry = TopicRegistry::new();
        registry.insert_snippet("greet", Snippet::new("g1", "<yrwp>"));
        let mut fx = Fixture::with_registry(registry);
        let d = fx.dialogue();
        assert_eq!(parse_tags(&d, "<greet>"), "<yrwp>");
    }

    #[test]
    fn money_formatting() {
        assert_eq!(format_money(0), "$0.00");
        assert_eq!(format_money(1205), "$12.05");
        assert_eq!(format_money(-50), "-$0.50");
    }

    proptest! {
        #[test]
        fn tags_render_for_any_price(price: i64, charges: i64, stamp: i64) {
            let mut fx = Fixture::new();
            fx.world = fx.world.with_item_type(ItemType::new("gold", "gold bar", price));
            fx.alpha.inventory = vec![
                Item::new("gold").with_charges(charges),
                Item::new("gold").with_charges(charges),
            ];
            fx.beta.inventory = fx.alpha.inventory.clone();
            fx.alpha.set_value("stamp", &stamp.to_string());
            let mut d = fx.dialogue();
            d.cur_item = Some("gold".into());
            let text = parse_tags(
                &d,
                "<topic_item> <topic_item_price> <topic_item_my_total_price> \
                 <topic_item_your_total_price> <punc> <mypronoun> <stamp>",
            );
            prop_assert!(text.starts_with("gold bar "));
            prop_assert!(text.ends_with("????"));
        }
    }
}
