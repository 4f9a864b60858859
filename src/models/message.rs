use crate::store::Fields;

use super::phone::compose_phone;

pub const COLLECTION: &str = "messages";

/// A submission of the public contact form.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ContactMessage {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub message: String,
}

impl ContactMessage {
    /// Trimmed copy of the form fields; the phone is prefix and number
    /// joined the way the form shows them.
    pub fn new(name: &str, email: &str, phone_code: &str, phone_number: &str, message: &str) -> Self {
        let phone = if phone_number.trim().is_empty() {
            String::new()
        } else {
            compose_phone(phone_code, phone_number)
        };
        ContactMessage {
            name: name.trim().to_string(),
            email: email.trim().to_string(),
            phone,
            message: message.trim().to_string(),
        }
    }

    /// Name, email and message are required.
    pub fn is_complete(&self) -> bool {
        !self.name.is_empty() && self.email.contains('@') && !self.message.is_empty()
    }

    pub fn to_fields(&self, received_at: &str) -> Fields {
        let mut f = Fields::new();
        f.insert("name".into(), self.name.clone().into());
        f.insert("email".into(), self.email.clone().into());
        f.insert("phone".into(), self.phone.clone().into());
        f.insert("message".into(), self.message.clone().into());
        f.insert("receivedAt".into(), received_at.into());
        f
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phone_only_when_number_given() {
        let m = ContactMessage::new(" Anna ", "anna@example.com", "+39", "", "Ciao");
        assert_eq!(m.name, "Anna");
        assert_eq!(m.phone, "");
        let m = ContactMessage::new("Anna", "anna@example.com", "+39", "333 1234", "Ciao");
        assert_eq!(m.phone, "+39 333 1234");
        assert_eq!(m.to_fields("t")["phone"], "+39 333 1234");
    }

    #[test]
    fn completeness() {
        assert!(ContactMessage::new("A", "a@b.it", "", "", "x").is_complete());
        assert!(!ContactMessage::new("A", "nope", "", "", "x").is_complete());
        assert!(!ContactMessage::new("A", "a@b.it", "", "", "  ").is_complete());
    }
}
