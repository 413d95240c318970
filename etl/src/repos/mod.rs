pub mod forecasts;
pub mod tide_extremes;

use tokio_postgres::Row;

pub fn from_rows<A, F>(rows: Vec<Row>, map: F) -> Result<Vec<A>, tokio_postgres::Error>
where
    F: Fn(&Row) -> Result<A, tokio_postgres::Error>,
{
    rows.iter().map(map).collect()
}
