//! Money and item exchange between the speakers.

use pv_core::{GameWorld, Item, Role};

use super::ItemTransfer;
use crate::dialogue::Dialogue;

fn make_item(world: &dyn GameWorld, id: &str) -> Item {
    world
        .item_type(id)
        .map(|t| Item::of_type(&t))
        .unwrap_or_else(|| Item::new(id))
}

fn counts_by_charges(world: &dyn GameWorld, id: &str) -> bool {
    world.item_type(id).is_some_and(|t| t.count_by_charges)
}

pub(super) fn item_name(world: &dyn GameWorld, id: &str) -> String {
    world
        .item_type(id)
        .map(|t| t.name)
        .unwrap_or_else(|| id.to_string())
}

/// The human side pays `amount`, drawing on what the NPC owes first.
///
/// Returns `false` and changes nothing when the two together fall short.
pub(super) fn pay(d: &mut Dialogue<'_>, amount: i64) -> bool {
    let owed = d.actor(Role::Beta).debt().max(0);
    if owed >= amount {
        d.actor_mut(Role::Beta).add_debt(-amount);
        return true;
    }
    let cash = d.actor(Role::Alpha).cash();
    if cash.saturating_add(owed) < amount {
        return false;
    }
    d.actor_mut(Role::Alpha).set_cash(cash - (amount - owed));
    d.actor_mut(Role::Beta).add_debt(-owed);
    true
}

/// Hand items to the human side, announcing the gift if an NPC gave them.
pub(super) fn receive_item(d: &mut Dialogue<'_>, transfer: &ItemTransfer) {
    let item = make_item(d.world(), &transfer.item);
    let giver = d
        .has_actor(Role::Beta)
        .then(|| d.actor(Role::Beta).disp_name());
    let notice = match &transfer.container {
        None => {
            let name = item_name(d.world(), &transfer.item);
            if counts_by_charges(d.world(), &transfer.item) {
                d.actor_mut(Role::Alpha)
                    .i_add(item.with_charges(transfer.count));
            } else {
                for _ in 0..transfer.count {
                    d.actor_mut(Role::Alpha).i_add(item.clone());
                }
            }
            giver.map(|giver| {
                if transfer.count == 1 {
                    format!("{giver} gives you a {name}.")
                } else {
                    format!("{giver} gives you {} {name}.", transfer.count)
                }
            })
        }
        Some(container) => {
            let name = item_name(d.world(), container);
            let packed = item
                .with_charges(transfer.count)
                .in_container(container.clone());
            d.actor_mut(Role::Alpha).i_add(packed);
            giver.map(|giver| format!("{giver} gives you a {name}."))
        }
    };
    if let Some(notice) = notice {
        d.world_mut().popup(&notice);
    }
}

/// The human side buys an item, or is told it can't afford it.
pub(super) fn buy_item(d: &mut Dialogue<'_>, transfer: &ItemTransfer) {
    if !pay(d, transfer.cost) {
        d.world_mut().popup("You can't afford it!");
        return;
    }
    receive_item(d, transfer);
}

/// The human side sells an item to the NPC, who then owes the price.
pub(super) fn sell_item(d: &mut Dialogue<'_>, transfer: &ItemTransfer) {
    let by_charges = counts_by_charges(d.world(), &transfer.item);
    let name = item_name(d.world(), &transfer.item);
    let seller = d.actor_mut(Role::Alpha);
    let sold = if by_charges && seller.charges_of(&transfer.item) >= transfer.count {
        seller.use_charges(&transfer.item, transfer.count)
    } else if seller.has_amount(&transfer.item, transfer.count) {
        seller.use_amount(&transfer.item, transfer.count)
    } else {
        d.world_mut().popup(&format!("You don't have a {name}!"));
        return;
    };
    let buyer = d.actor_mut(Role::Beta);
    for item in sold {
        buyer.i_add(item);
    }
    let buyer_name = buyer.disp_name();
    buyer.add_debt(transfer.cost);
    let notice = if transfer.count == 1 {
        format!("You give {buyer_name} a {name}.")
    } else {
        format!("You give {buyer_name} {} {name}.", transfer.count)
    };
    d.world_mut().popup(&notice);
}

/// Use up items or charges held by a speaker.
pub(super) fn consume_item(d: &mut Dialogue<'_>, role: Role, item: &str, count: i64) {
    let name = item_name(d.world(), item);
    let holder = d.actor_mut(role);
    if holder.charges_of(item) >= count {
        holder.use_charges(item, count);
    } else if holder.has_amount(item, count) {
        holder.use_amount(item, count);
    } else {
        let who = holder.disp_name();
        d.world_mut().popup(&format!("{who} doesn't have a {name}!"));
    }
}

/// Move the current item from `seller` to the other speaker.
///
/// When `trade` is set the NPC's debt is settled against the value moved:
/// whatever the NPC owed is cleared and replaced by the price, negative when
/// the NPC was the seller.
pub(super) fn bulk_trade(d: &mut Dialogue<'_>, seller: Role, trade: bool, quantity: Option<i64>) {
    let Some(item) = d.cur_item.clone() else {
        tracing::warn!("bulk trade without a current item");
        return;
    };
    let item_type = d.world().item_type(&item);
    let by_charges = item_type.as_ref().is_some_and(|t| t.count_by_charges);
    let unit_price = item_type.as_ref().map_or(0, |t| t.price);
    let limit = quantity.unwrap_or(i64::MAX);

    let from = d.actor_mut(seller);
    let moved = if by_charges {
        let available = from.charges_of(&item).min(limit);
        from.use_charges(&item, available)
    } else {
        from.use_amount(&item, limit)
    };
    let amount = if by_charges {
        moved.iter().fold(0i64, |sum, i| sum.saturating_add(i.charges))
    } else {
        moved.len() as i64
    };

    if trade {
        let npc = d.actor_mut(Role::Beta);
        let owed = npc.debt();
        let sign = if seller == Role::Beta { -1 } else { 1 };
        let price = unit_price
            .saturating_mul(amount)
            .saturating_mul(sign)
            .saturating_add(owed);
        npc.add_debt(-owed);
        npc.add_debt(price);
    }

    let to = d.actor_mut(seller.other());
    for item in moved {
        to.i_add(item);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::Fixture;
    use pv_core::sandbox::{Sandbox, WorldEvent};
    use pv_core::{ItemType, Talker};

    fn stocked() -> Fixture {
        let mut fx = Fixture::new();
        fx.world = Sandbox::new()
            .with_item_type(ItemType::new("water", "clean water", 50).by_charges())
            .with_item_type(ItemType::new("knife", "knife", 300));
        fx
    }

    #[test]
    fn buying_what_you_cannot_afford_changes_nothing() {
        let mut fx = stocked();
        fx.alpha.cash = 50;
        let mut d = fx.dialogue();
        buy_item(&mut d, &ItemTransfer::new("knife", 1).with_cost(100));
        drop(d);
        assert_eq!(fx.alpha.cash, 50);
        assert!(fx.alpha.inventory.is_empty());
        assert_eq!(fx.world.events.len(), 1);
    }

    #[test]
    fn buying_spends_debt_then_cash() {
        let mut fx = stocked();
        fx.alpha.cash = 80;
        fx.beta.debt = 30;
        let mut d = fx.dialogue();
        buy_item(&mut d, &ItemTransfer::new("knife", 1).with_cost(100));
        drop(d);
        assert_eq!(fx.alpha.cash, 10);
        assert_eq!(fx.beta.debt, 0);
        assert_eq!(fx.alpha.inventory.len(), 1);
        assert_eq!(
            fx.world.events,
            vec![WorldEvent::Popup(
                "Bree gives you a knife.".into()
            )]
        );
    }

    #[test]
    fn extreme_balances_do_not_overflow() {
        let mut fx = stocked();
        fx.alpha.cash = i64::MAX;
        fx.beta.debt = 10;
        let mut d = fx.dialogue();
        buy_item(&mut d, &ItemTransfer::new("knife", 1).with_cost(i64::MAX));
        drop(d);
        assert_eq!(fx.alpha.cash, 10);
        assert_eq!(fx.beta.debt, 0);
        assert_eq!(fx.alpha.inventory.len(), 1);
    }

    #[test]
    fn charges_arrive_as_one_stack() {
        let mut fx = stocked();
        let mut d = fx.dialogue();
        receive_item(&mut d, &ItemTransfer::new("water", 3));
        receive_item(&mut d, &ItemTransfer::new("knife", 2));
        drop(d);
        assert_eq!(fx.alpha.charges_of("water"), 3);
        assert!(fx.alpha.has_amount("knife", 2));
        assert_eq!(fx.alpha.inventory.len(), 3);
    }

    #[test]
    fn container_wraps_the_delivery() {
        let mut fx = stocked();
        let mut d = fx.dialogue();
        receive_item(&mut d, &ItemTransfer::new("water", 2).with_container("jar"));
        drop(d);
        let jar = &fx.alpha.inventory[0];
        assert_eq!(jar.type_id, "jar");
        assert_eq!(jar.contents[0].charges, 2);
    }

    #[test]
    fn selling_creates_debt() {
        let mut fx = stocked();
        fx.alpha.inventory.push(Item::new("knife"));
        let mut d = fx.dialogue();
        sell_item(&mut d, &ItemTransfer::new("knife", 1).with_cost(250));
        sell_item(&mut d, &ItemTransfer::new("knife", 1).with_cost(250));
        drop(d);
        assert_eq!(fx.beta.debt, 250);
        assert!(fx.beta.has_amount("knife", 1));
        assert_eq!(
            fx.world.messages().count(),
            0,
            "sales report through popups"
        );
        assert!(fx.world.events.iter().any(|e| matches!(
            e,
            WorldEvent::Popup(text) if text == "You don't have a knife!"
        )));
    }

    #[test]
    fn bulk_trade_settles_debt() {
        let mut fx = stocked();
        fx.beta.inventory.push(Item::new("water").with_charges(4));
        fx.beta.debt = 20;
        let mut d = fx.dialogue();
        d.cur_item = Some("water".into());
        bulk_trade(&mut d, Role::Beta, true, Some(3));
        drop(d);
        assert_eq!(fx.alpha.charges_of("water"), 3);
        assert_eq!(fx.beta.charges_of("water"), 1);
        assert_eq!(fx.beta.debt, 20 - 150);
    }

    #[test]
    fn consume_reports_missing_items() {
        let mut fx = stocked();
        fx.beta.inventory.push(Item::new("knife"));
        let mut d = fx.dialogue();
        consume_item(&mut d, Role::Beta, "knife", 1);
        consume_item(&mut d, Role::Alpha, "knife", 1);
        drop(d);
        assert!(fx.beta.inventory.is_empty());
        assert_eq!(
            fx.world.events,
            vec![WorldEvent::Popup(
                "Ash doesn't have a knife!".into()
            )]
        );
    }
}
