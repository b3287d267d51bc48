//! Checked data products across the rendered result list.

use serde::Serialize;

use crate::model::types::DataProductRef;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectedItem {
    pub id: i64,
    pub label: String,
}

/// Insertion-ordered set of product ids, each with its display label.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SelectionSet {
    items: Vec<SelectedItem>,
}

impl SelectionSet {
    /// Flip the checked state of `product`; returns the new state.
    pub fn toggle(&mut self, product: &DataProductRef) -> bool {
        let checked = !self.contains(product.id);
        self.set(product, checked);
        checked
    }

    pub fn set(&mut self, product: &DataProductRef, checked: bool) {
        let present = self.contains(product.id);
        match (checked, present) {
            (true, false) => self.items.push(SelectedItem {
                id: product.id,
                label: product.label(),
            }),
            (false, true) => self.items.retain(|i| i.id != product.id),
            _ => {}
        }
    }

    pub fn contains(&self, id: i64) -> bool {
        self.items.iter().any(|i| i.id == id)
    }

    pub fn ids(&self) -> Vec<i64> {
        self.items.iter().map(|i| i.id).collect()
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.items.iter().map(|i| i.label.as_str())
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(id: i64, title: &str) -> DataProductRef {
        DataProductRef {
            id,
            title: title.into(),
            kind: "dataset".into(),
        }
    }

    #[test]
    fn toggle_keeps_insertion_order() {
        let mut sel = SelectionSet::default();
        assert!(sel.toggle(&product(9, "Vitals")));
        assert!(sel.toggle(&product(2, "Labs")));
        assert!(sel.toggle(&product(5, "Imaging")));
        assert!(!sel.toggle(&product(2, "Labs")));
        assert_eq!(sel.ids(), vec![9, 5]);
        assert_eq!(
            sel.labels().collect::<Vec<_>>(),
            vec!["Vitals (dataset)", "Imaging (dataset)"]
        );
    }

    #[test]
    fn set_is_idempotent() {
        let mut sel = SelectionSet::default();
        let p = product(1, "Vitals");
        sel.set(&p, true);
        sel.set(&p, true);
        assert_eq!(sel.len(), 1);
        sel.set(&p, false);
        sel.set(&p, false);
        assert!(sel.is_empty());
    }
}
