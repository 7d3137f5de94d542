mod common;

use assert_matches::assert_matches;
use common::{address_input, card_input, cart_item};
use rust_decimal_macros::dec;
use std::sync::Arc;
use uuid::Uuid;
use zalekart_core::{
    config::AppConfig,
    errors::ServiceError,
    events::{Event, EventSender},
    models::{AddressPatch, PaymentMethod},
    repositories::{AddressRepository, InMemoryAddressRepository},
    AddressBookService, Cart, CardWallet, CheckoutService,
};

fn loaded_cart() -> Cart {
    let mut cart = Cart::new();
    cart.add_item(cart_item("1", dec!(1299), dec!(2499), 1)).unwrap();
    cart.add_item(cart_item("3", dec!(999), dec!(999), 2)).unwrap();
    cart
}

#[tokio::test]
async fn shopper_checks_out_to_a_selected_address_with_coupon() {
    let config = AppConfig::default();
    let user_id = Uuid::new_v4();
    let repo = Arc::new(InMemoryAddressRepository::new());
    let (sender, mut rx) = EventSender::channel(config.event_channel_capacity);

    let addresses = AddressBookService::new(user_id, repo.clone()).with_events(sender.clone());
    let home = addresses.add(address_input("Home", false)).await.unwrap();
    let work = addresses.add(address_input("Work", false)).await.unwrap();
    addresses.select(&work.id).await.unwrap();

    let mut cart = loaded_cart();
    let checkout = CheckoutService::from_config(&config).with_events(sender);
    cart.apply_coupon("save10", checkout.pricing()).unwrap();

    let draft = checkout
        .prepare(
            &addresses.snapshot().await,
            &CardWallet::new(),
            &cart,
            Some(PaymentMethod::Upi),
        )
        .await
        .unwrap();

    assert_eq!(draft.address.id, work.id);
    assert_eq!(draft.coupon_code.as_deref(), Some("SAVE10"));
    assert_eq!(draft.totals.subtotal, dec!(3297));
    assert_eq!(draft.totals.coupon_discount, dec!(330));
    assert_eq!(draft.totals.delivery_fee, dec!(0));
    assert_eq!(draft.totals.total, dec!(2967));
    assert_eq!(draft.totals.item_count, 3);

    let mut received = Vec::new();
    while let Ok(event) = rx.try_recv() {
        received.push(event);
    }
    assert_eq!(
        received,
        vec![
            Event::AddressAdded(home.id.clone()),
            Event::DefaultAddressChanged(home.id.clone()),
            Event::AddressAdded(work.id.clone()),
            Event::AddressSelected(work.id.clone()),
            Event::OrderDrafted {
                order_id: draft.order_id,
                total: dec!(2967),
            },
        ]
    );

    let stored = repo.list_for_user(user_id).await.unwrap();
    assert_eq!(stored.len(), 2);
    assert!(stored.iter().any(|r| r.id == home.id.as_str() && r.is_default));
}

#[tokio::test]
async fn removing_selected_address_redirects_the_order_to_default() {
    let repo = Arc::new(InMemoryAddressRepository::new());
    let addresses = AddressBookService::new(Uuid::new_v4(), repo);
    let home = addresses.add(address_input("Home", false)).await.unwrap();
    let work = addresses.add(address_input("Work", false)).await.unwrap();

    addresses.select(&work.id).await.unwrap();
    addresses.remove(&work.id).await.unwrap();

    let draft = CheckoutService::from_config(&AppConfig::default())
        .prepare(
            &addresses.snapshot().await,
            &CardWallet::new(),
            &loaded_cart(),
            Some(PaymentMethod::CashOnDelivery),
        )
        .await
        .unwrap();

    assert_eq!(draft.address.id, home.id);
}

#[tokio::test]
async fn address_book_survives_a_reload() {
    let user_id = Uuid::new_v4();
    let repo = Arc::new(InMemoryAddressRepository::new());

    let first_session = AddressBookService::new(user_id, repo.clone());
    first_session.add(address_input("Home", false)).await.unwrap();
    let work = first_session.add(address_input("Work", true)).await.unwrap();
    first_session
        .update(
            &work.id,
            AddressPatch {
                city: Some("Pune".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let second_session = AddressBookService::load(user_id, repo).await.unwrap();
    let book = second_session.snapshot().await;

    assert_eq!(book, first_session.snapshot().await);
    let active = book.resolve_active().unwrap();
    assert_eq!(active.id, work.id);
    assert_eq!(active.city, "Pune");
}

#[tokio::test]
async fn card_checkout_charges_the_default_card() {
    let repo = Arc::new(InMemoryAddressRepository::new());
    let addresses = AddressBookService::new(Uuid::new_v4(), repo);
    addresses.add(address_input("Home", false)).await.unwrap();

    let mut wallet = CardWallet::new();
    wallet.add(card_input("4111111111111111"));
    let mastercard = wallet.add(card_input("5500000000000004"));
    wallet.set_default(&mastercard.id).unwrap();

    let checkout = CheckoutService::from_config(&AppConfig::default());
    let book = addresses.snapshot().await;

    let draft = checkout
        .prepare(&book, &wallet, &loaded_cart(), Some(PaymentMethod::Card))
        .await
        .unwrap();
    assert_eq!(draft.card.map(|c| c.id), Some(mastercard.id.clone()));

    wallet.remove(&mastercard.id).unwrap();
    let visa = wallet.cards()[0].id.clone();
    wallet.remove(&visa).unwrap();
    assert_matches!(
        checkout
            .prepare(&book, &wallet, &loaded_cart(), Some(PaymentMethod::Card))
            .await,
        Err(ServiceError::InvalidOperation(_))
    );
}

#[tokio::test]
async fn small_orders_pay_delivery() {
    let repo = Arc::new(InMemoryAddressRepository::new());
    let addresses = AddressBookService::new(Uuid::new_v4(), repo);
    addresses.add(address_input("Home", false)).await.unwrap();

    let mut cart = Cart::new();
    cart.add_item(cart_item("5", dec!(499), dec!(799), 1)).unwrap();

    let draft = CheckoutService::from_config(&AppConfig::default())
        .prepare(
            &addresses.snapshot().await,
            &CardWallet::new(),
            &cart,
            Some(PaymentMethod::NetBanking),
        )
        .await
        .unwrap();

    assert_eq!(draft.totals.delivery_fee, dec!(40));
    assert_eq!(draft.totals.savings, dec!(300));
    assert_eq!(draft.totals.total, dec!(539));
}
