pub mod aggregator;
pub mod cache;
pub mod collector;
pub mod offers;
pub mod storage;
pub mod validation;
pub mod yields;

pub use aggregator::aggregate;
pub use cache::{DepositCache, YieldCache};
pub use collector::OfferCollector;
pub use offers::build_offer_list;
pub use storage::RecipientStore;
pub use yields::YieldService;
