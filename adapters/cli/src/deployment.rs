use std::str::FromStr;

use cultivator_defence_core::CellCoord;

/// Separates the person type key from the target tile.
const KEY_DELIMITER: char = '@';
/// Separates the column from the row.
const COORD_DELIMITER: char = ',';

/// Defender requested on the command line as `key@column,row`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct DeploymentOrder {
    /// Catalog key of the defender.
    pub(crate) person_type: String,
    /// Tile that should host the defender.
    pub(crate) cell: CellCoord,
}

/// Errors that can occur while parsing deployment orders.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub(crate) enum DeploymentParseError {
    /// The order lacked the `@` separator.
    #[error("expected `key@column,row`, found `{0}`")]
    MissingTile(String),
    /// The person type key was empty.
    #[error("deployment order `{0}` names no person type")]
    MissingKey(String),
    /// The tile could not be parsed.
    #[error("invalid tile `{0}`, expected `column,row`")]
    InvalidTile(String),
}

impl FromStr for DeploymentOrder {
    type Err = DeploymentParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        let (key, tile) = trimmed
            .split_once(KEY_DELIMITER)
            .ok_or_else(|| DeploymentParseError::MissingTile(trimmed.to_owned()))?;
        let key = key.trim();
        if key.is_empty() {
            return Err(DeploymentParseError::MissingKey(trimmed.to_owned()));
        }

        Ok(Self {
            person_type: key.to_owned(),
            cell: parse_tile(tile)?,
        })
    }
}

fn parse_tile(value: &str) -> Result<CellCoord, DeploymentParseError> {
    let invalid = || DeploymentParseError::InvalidTile(value.trim().to_owned());
    let (column, row) = value.split_once(COORD_DELIMITER).ok_or_else(invalid)?;
    let column = column.trim().parse::<i32>().map_err(|_| invalid())?;
    let row = row.trim().parse::<i32>().map_err(|_| invalid())?;
    Ok(CellCoord::new(column, row))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_key_and_tile() {
        let order: DeploymentOrder = " inner_disciple@ 5, 4 ".parse().expect("valid order");
        assert_eq!(
            order,
            DeploymentOrder {
                person_type: "inner_disciple".into(),
                cell: CellCoord::new(5, 4),
            }
        );
    }

    #[test]
    fn rejects_malformed_orders() {
        assert_eq!(
            "elder".parse::<DeploymentOrder>(),
            Err(DeploymentParseError::MissingTile("elder".into()))
        );
        assert_eq!(
            "@1,2".parse::<DeploymentOrder>(),
            Err(DeploymentParseError::MissingKey("@1,2".into()))
        );
        assert_eq!(
            "elder@1;2".parse::<DeploymentOrder>(),
            Err(DeploymentParseError::InvalidTile("1;2".into()))
        );
        assert_eq!(
            "elder@x,2".parse::<DeploymentOrder>(),
            Err(DeploymentParseError::InvalidTile("x,2".into()))
        );
    }
}
