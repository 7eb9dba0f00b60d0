//! The pending confirmation and its editable scratch fields.

use nutribot_core::types::{ConfirmationData, MessageId};

/// A candidate identification awaiting accept or cancel.
///
/// Points at the confirmation-role message it was created for and holds the
/// food and quantity the user may revise before accepting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingConfirmation {
    message_id: MessageId,
    food: String,
    quantity: String,
}

/// Trimmed food and quantity accepted by the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmedFood {
    pub food: String,
    pub quantity: String,
}

impl PendingConfirmation {
    /// Seed the scratch fields from the service's estimate.
    pub fn new(message_id: MessageId, data: &ConfirmationData) -> Self {
        Self {
            message_id,
            food: data.estimated_food.clone(),
            quantity: data.estimated_quantity.clone(),
        }
    }

    pub fn message_id(&self) -> MessageId {
        self.message_id
    }

    pub fn food(&self) -> &str {
        &self.food
    }

    pub fn quantity(&self) -> &str {
        &self.quantity
    }

    /// Overwrite whichever scratch fields are given. No validation here.
    pub fn edit(&mut self, food: Option<&str>, quantity: Option<&str>) {
        if let Some(food) = food {
            self.food = food.to_string();
        }
        if let Some(quantity) = quantity {
            self.quantity = quantity.to_string();
        }
    }

    /// The trimmed scratch values, or `None` if either is blank.
    pub fn accepted(&self) -> Option<ConfirmedFood> {
        let food = self.food.trim();
        let quantity = self.quantity.trim();
        if food.is_empty() || quantity.is_empty() {
            return None;
        }
        Some(ConfirmedFood {
            food: food.to_string(),
            quantity: quantity.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn pending() -> PendingConfirmation {
        let data = ConfirmationData {
            estimated_food: "manzana".into(),
            estimated_quantity: "2 unidades".into(),
            confirmation_message: "¿Confirmás 2 manzanas?".into(),
        };
        PendingConfirmation::new(MessageId::new(Utc::now(), 3), &data)
    }

    // ---- scratch fields ----

    #[test]
    fn test_scratch_initialized_from_estimate() {
        let p = pending();
        assert_eq!(p.food(), "manzana");
        assert_eq!(p.quantity(), "2 unidades");
        assert_eq!(p.message_id().seq, 3);
    }

    #[test]
    fn test_edit_updates_only_given_fields() {
        let mut p = pending();
        p.edit(None, Some("3 unidades"));
        assert_eq!(p.food(), "manzana");
        assert_eq!(p.quantity(), "3 unidades");

        p.edit(Some("pera"), None);
        assert_eq!(p.food(), "pera");
        assert_eq!(p.quantity(), "3 unidades");
    }

    // ---- accepted ----

    #[test]
    fn test_accepted_trims_values() {
        let mut p = pending();
        p.edit(Some("  manzana verde "), Some(" 1 unidad\t"));
        assert_eq!(
            p.accepted(),
            Some(ConfirmedFood {
                food: "manzana verde".into(),
                quantity: "1 unidad".into(),
            })
        );
    }

    #[test]
    fn test_accepted_rejects_blank_fields() {
        let mut p = pending();
        p.edit(Some("   "), None);
        assert!(p.accepted().is_none());

        let mut p = pending();
        p.edit(None, Some(""));
        assert!(p.accepted().is_none());
    }
}
