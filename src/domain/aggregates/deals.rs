//! Splits order lines into deal bundles and standalone items

use rust_decimal::Decimal;
use super::order::LineItem;

pub const UNKNOWN_DEAL: &str = "Unknown Deal";

#[derive(Clone, Debug, PartialEq)]
pub struct DealGroup {
    pub name: String,
    pub description: Option<String>,
    pub items: Vec<LineItem>,
    pub total_quantity: u32,
    pub total_price: Decimal,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ItemGroups {
    /// In order of first appearance.
    pub deals: Vec<DealGroup>,
    pub regular: Vec<LineItem>,
}

impl ItemGroups {
    pub fn from_items(items: &[LineItem]) -> Self {
        let mut groups = Self::default();
        for item in items {
            if !item.is_from_deal {
                groups.regular.push(item.clone());
                continue;
            }
            let name = item.deal_name.as_deref().filter(|n| !n.is_empty()).unwrap_or(UNKNOWN_DEAL);
            let idx = match groups.deals.iter().position(|g| g.name == name) {
                Some(idx) => idx,
                None => {
                    groups.deals.push(DealGroup {
                        name: name.to_string(), description: None, items: vec![],
                        total_quantity: 0, total_price: Decimal::ZERO,
                    });
                    groups.deals.len() - 1
                }
            };
            let group = &mut groups.deals[idx];
            if group.description.is_none() {
                group.description = item.deal_description.clone().filter(|d| !d.is_empty());
            }
            group.total_quantity = group.total_quantity.saturating_add(item.quantity);
            group.total_price = group.total_price.saturating_add(item.line_total());
            group.items.push(item.clone());
        }
        groups
    }

    pub fn deal(&self, name: &str) -> Option<&DealGroup> { self.deals.iter().find(|g| g.name == name) }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn deal_item(deal: Option<&str>, price: i64, quantity: u32) -> LineItem {
        LineItem {
            name: "Item".into(), price: Decimal::from(price), quantity, is_from_deal: true,
            deal_name: deal.map(Into::into), ..Default::default()
        }
    }

    #[test]
    fn test_items_of_one_deal_share_a_group() {
        let items = vec![deal_item(Some("Summer Bundle"), 100, 2), deal_item(Some("Summer Bundle"), 50, 1)];
        let groups = ItemGroups::from_items(&items);
        assert_eq!(groups.deals.len(), 1);
        let bundle = groups.deal("Summer Bundle").unwrap();
        assert_eq!(bundle.total_quantity, 3);
        assert_eq!(bundle.total_price, Decimal::from(250));
        assert_eq!(bundle.items.len(), 2);
        assert!(groups.regular.is_empty());
    }

    #[test]
    fn test_missing_deal_name_goes_to_unknown_deal() {
        let items = vec![deal_item(None, 300, 1), deal_item(Some(""), 200, 1)];
        let groups = ItemGroups::from_items(&items);
        assert_eq!(groups.deals.len(), 1);
        assert_eq!(groups.deals[0].name, UNKNOWN_DEAL);
        assert_eq!(groups.deals[0].total_price, Decimal::from(500));
    }

    #[test]
    fn test_regular_items_kept_in_order() {
        let mut plain = deal_item(None, 80, 3);
        plain.is_from_deal = false;
        plain.name = "Socks".into();
        let mut described = deal_item(Some("Eid Pack"), 1000, 1);
        described.deal_description = Some("3 suits for the price of 2".into());
        let groups = ItemGroups::from_items(&[plain.clone(), described]);
        assert_eq!(groups.regular, vec![plain]);
        assert_eq!(groups.deal("Eid Pack").unwrap().description.as_deref(), Some("3 suits for the price of 2"));
    }
}
