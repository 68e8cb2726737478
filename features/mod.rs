pub mod decode;
pub mod normalize;
pub mod record;

pub use decode::{Categorical, ChestPain, Flag, RestingEcg, Sex, Slope, Thal};
pub use normalize::{FEATURE_COUNT, Feature, FeatureVector, feature_order, normalize};
pub use record::{FieldValue, InputRecord};
