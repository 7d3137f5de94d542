#![allow(dead_code)]

use rust_decimal::Decimal;
use zalekart_core::models::{AddressType, CartItem, NewAddress, NewCard};

/// A valid address input named `name`.
pub fn address_input(name: &str, is_default: bool) -> NewAddress {
    NewAddress {
        name: name.to_string(),
        phone: "+91 9876543210".to_string(),
        address_line1: "Flat 101, Sunshine Apartments".to_string(),
        address_line2: Some("MG Road".to_string()),
        city: "Bangalore".to_string(),
        state: "Karnataka".to_string(),
        pincode: "560001".to_string(),
        address_type: AddressType::Home,
        is_default,
    }
}

pub fn card_input(number: &str) -> NewCard {
    NewCard {
        card_number: number.to_string(),
        card_holder: "Rahul Sharma".to_string(),
        expiry: "12/27".to_string(),
        brand: None,
        is_default: false,
    }
}

pub fn cart_item(product_id: &str, price: Decimal, original: Decimal, quantity: u32) -> CartItem {
    CartItem {
        product_id: product_id.to_string(),
        name: format!("Product {}", product_id),
        seller: "AudioTech".to_string(),
        unit_price: price,
        original_price: original,
        quantity,
    }
}
