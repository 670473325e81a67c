use crate::model::{Period, PriceObservation, StorageError, VariantListing};
use crate::storage::traits::PriceRepository;
use chrono::NaiveDate;
use rusqlite::{Connection, Row, params};
use std::sync::Mutex;

/// Read-only repository over the SQLite database written by the FIPE
/// scraper (tables: reference_months, brands, car_models, model_years,
/// car_prices). The connection sits behind a mutex so the store can be
/// shared across request threads.
pub struct SqlitePriceStore {
    conn: Mutex<Connection>,
}

impl SqlitePriceStore {
    pub fn new(db_path: &str) -> Result<Self, StorageError> {
        let conn = Connection::open(db_path)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    #[cfg(test)]
    fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    fn map_observation(row: &Row) -> Result<PriceObservation, rusqlite::Error> {
        Ok(PriceObservation {
            variant_id: row.get(0)?,
            period_date: row.get(1)?,
            price: row.get(2)?,
            model_id: row.get(3)?,
            model_name: row.get(4)?,
            brand_id: row.get(5)?,
            brand_name: row.get(6)?,
            description: row.get(7)?,
        })
    }
}

impl PriceRepository for SqlitePriceStore {
    fn latest_period(&self) -> Result<Option<Period>, StorageError> {
        let conn = self.conn.lock().map_err(|e| StorageError::Database(e.to_string()))?;
        let mut stmt = conn.prepare(
            "SELECT id, month_date FROM reference_months ORDER BY month_date DESC LIMIT 1",
        )?;

        let mut rows = stmt.query([])?;
        if let Some(row) = rows.next()? {
            Ok(Some(Period {
                id: row.get(0)?,
                date: row.get::<_, NaiveDate>(1)?,
            }))
        } else {
            Ok(None)
        }
    }

    fn list_available_variants(
        &self,
        brand_id: i64,
        period_id: i64,
    ) -> Result<Vec<VariantListing>, StorageError> {
        let conn = self.conn.lock().map_err(|e| StorageError::Database(e.to_string()))?;
        let mut stmt = conn.prepare(
            "SELECT DISTINCT my.id, cm.id, cm.model_name, my.year_description
             FROM model_years my
             JOIN car_models cm ON cm.id = my.car_model_id
             JOIN car_prices cp ON cp.model_year_id = my.id
             WHERE cm.brand_id = ?1 AND cp.reference_month_id = ?2",
        )?;

        let rows = stmt.query_map(params![brand_id, period_id], |row| {
            Ok(VariantListing {
                variant_id: row.get(0)?,
                model_id: row.get(1)?,
                model_name: row.get(2)?,
                description: row.get(3)?,
            })
        })?;

        let mut listings = Vec::new();
        for listing in rows {
            listings.push(listing?);
        }

        Ok(listings)
    }

    fn list_price_points_in_window(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        brand_id: Option<i64>,
    ) -> Result<Vec<PriceObservation>, StorageError> {
        let conn = self.conn.lock().map_err(|e| StorageError::Database(e.to_string()))?;
        let base = "SELECT my.id, rm.month_date, cp.price, cm.id, cm.model_name,
                           b.id, b.brand_name, my.year_description
                    FROM car_prices cp
                    JOIN reference_months rm ON rm.id = cp.reference_month_id
                    JOIN model_years my ON my.id = cp.model_year_id
                    JOIN car_models cm ON cm.id = my.car_model_id
                    JOIN brands b ON b.id = cm.brand_id
                    WHERE rm.month_date >= ?1 AND rm.month_date <= ?2";

        let mut observations = Vec::new();
        if let Some(brand) = brand_id {
            let sql = format!("{base} AND b.id = ?3");
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map(params![start, end, brand], Self::map_observation)?;
            for obs in rows {
                observations.push(obs?);
            }
        } else {
            let mut stmt = conn.prepare(base)?;
            let rows = stmt.query_map(params![start, end], Self::map_observation)?;
            for obs in rows {
                observations.push(obs?);
            }
        }

        Ok(observations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded_store() -> SqlitePriceStore {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "
            CREATE TABLE reference_months (
                id INTEGER PRIMARY KEY,
                month_code TEXT NOT NULL,
                month_date TEXT NOT NULL
            );
            CREATE TABLE brands (
                id INTEGER PRIMARY KEY,
                brand_code TEXT NOT NULL,
                brand_name TEXT NOT NULL
            );
            CREATE TABLE car_models (
                id INTEGER PRIMARY KEY,
                brand_id INTEGER NOT NULL,
                model_code TEXT NOT NULL,
                model_name TEXT NOT NULL
            );
            CREATE TABLE model_years (
                id INTEGER PRIMARY KEY,
                car_model_id INTEGER NOT NULL,
                year_code TEXT NOT NULL,
                year_description TEXT NOT NULL
            );
            CREATE TABLE car_prices (
                id INTEGER PRIMARY KEY,
                reference_month_id INTEGER NOT NULL,
                model_year_id INTEGER NOT NULL,
                price REAL NOT NULL
            );

            INSERT INTO reference_months VALUES (1, '301', '2023-01-01');
            INSERT INTO reference_months VALUES (2, '313', '2024-01-01');
            INSERT INTO brands VALUES (1, '59', 'Volkswagen');
            INSERT INTO car_models VALUES (10, 1, '5585', 'Gol 1.0');
            INSERT INTO model_years VALUES (100, 10, '2024-5', '2024 Flex');
            INSERT INTO model_years VALUES (101, 10, '2020-1', '2020 Gasolina');
            INSERT INTO car_prices VALUES (1000, 1, 100, 50000.0);
            INSERT INTO car_prices VALUES (1001, 2, 100, 45000.0);
            INSERT INTO car_prices VALUES (1002, 1, 101, 30000.0);
            ",
        )
        .unwrap();
        SqlitePriceStore::from_connection(conn)
    }

    #[test]
    fn latest_period_picks_maximum_date() {
        let store = seeded_store();
        let period = store.latest_period().unwrap().unwrap();
        assert_eq!(period.id, 2);
        assert_eq!(period.date, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
    }

    #[test]
    fn latest_period_empty_store_is_none() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE reference_months (id INTEGER PRIMARY KEY, month_code TEXT, month_date TEXT);",
        )
        .unwrap();
        let store = SqlitePriceStore::from_connection(conn);
        assert!(store.latest_period().unwrap().is_none());
    }

    #[test]
    fn available_variants_scoped_to_period() {
        let store = seeded_store();
        // Only variant 100 is priced in period 2.
        let listings = store.list_available_variants(1, 2).unwrap();
        assert_eq!(listings.len(), 1);
        assert_eq!(listings[0].variant_id, 100);
        assert_eq!(listings[0].model_name, "Gol 1.0");
        assert_eq!(listings[0].description, "2024 Flex");
    }

    #[test]
    fn window_query_joins_names_and_respects_bounds() {
        let store = seeded_store();
        let start = NaiveDate::from_ymd_opt(2023, 6, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let obs = store.list_price_points_in_window(start, end, None).unwrap();
        assert_eq!(obs.len(), 1);
        assert_eq!(obs[0].variant_id, 100);
        assert_eq!(obs[0].brand_name, "Volkswagen");
        assert_eq!(obs[0].price, 45000.0);

        let none = store
            .list_price_points_in_window(start, end, Some(99))
            .unwrap();
        assert!(none.is_empty());
    }
}
