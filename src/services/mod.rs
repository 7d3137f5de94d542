pub mod address_book;
pub mod address_sync;
pub mod cart;
pub mod checkout;
pub(crate) mod default_slot;
pub mod payment_methods;
pub mod pricing;
pub mod wishlist;

pub use address_book::AddressBook;
pub use address_sync::AddressBookService;
pub use cart::Cart;
pub use checkout::CheckoutService;
pub use payment_methods::CardWallet;
pub use pricing::PricingRules;
pub use wishlist::Wishlist;
