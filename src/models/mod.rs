pub mod address;
pub mod cart;
pub mod order;
pub mod payment_card;
pub mod wishlist;

pub use address::{Address, AddressId, AddressPatch, AddressType, NewAddress};
pub use cart::{CartItem, CartTotals, MAX_LINE_QUANTITY};
pub use order::{OrderDraft, PaymentMethod};
pub use payment_card::{CardBrand, CardId, CardPatch, NewCard, SavedCard};
pub use wishlist::WishlistItem;

/// Records that carry an "is default" flag inside a collection that must
/// hold at most one default.
pub trait DefaultFlag {
    fn is_default(&self) -> bool;
    fn set_default_flag(&mut self, value: bool);
}
