use thiserror::Error;

use crate::ids::FieldId;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("field {0} is the item shape of a list and cannot be removed")]
    ListItemRemoval(FieldId),
}

pub type Result<T> = std::result::Result<T, ModelError>;
