use std::str::FromStr;

use anyhow::Context;
use derive_builder::Builder;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};

use crate::data::{Address, Order, Restaurant, SortBy};

/// Number of documents the featured listing returns.
pub const FEATURED_LIMIT: i64 = 4;

const SCHEMA: [&str; 3] = [
    r#"
CREATE TABLE IF NOT EXISTS restaurant (
    restaurant_id TEXT PRIMARY KEY,
    name          TEXT NOT NULL,
    cuisine       TEXT NOT NULL,
    borough       TEXT NOT NULL,
    building      TEXT NOT NULL DEFAULT '',
    street        TEXT NOT NULL DEFAULT '',
    zipcode       TEXT NOT NULL DEFAULT ''
)"#,
    r#"
CREATE TABLE IF NOT EXISTS grade (
    id         INTEGER PRIMARY KEY AUTOINCREMENT,
    restaurant TEXT NOT NULL REFERENCES restaurant (restaurant_id),
    score      INTEGER NOT NULL
)"#,
    "CREATE INDEX IF NOT EXISTS grade_restaurant ON grade (restaurant)",
];

// average_rating is the mean grade score, 0 for restaurants without grades
const SELECT_RESTAURANT: &str = r#"
SELECT
    r.restaurant_id, r.name, r.cuisine, r.borough,
    r.building, r.street, r.zipcode,
    COALESCE((SELECT AVG(g.score) FROM grade g WHERE g.restaurant = r.restaurant_id), 0.0)
        AS average_rating
FROM restaurant r"#;

/// Open the restaurant store and make sure its tables exist.
pub async fn connect(url: &str, max_connections: u32) -> anyhow::Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(url)
        .with_context(|| format!("invalid database url {url}"))?
        .create_if_missing(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect_with(options)
        .await
        .with_context(|| format!("fail to open database {url}"))?;

    init_schema(&pool).await?;
    Ok(pool)
}

pub async fn init_schema(db_conn: &SqlitePool) -> anyhow::Result<()> {
    for statement in SCHEMA {
        sqlx::query(statement)
            .execute(db_conn)
            .await
            .with_context(|| "fail to create restaurant schema")?;
    }
    Ok(())
}

#[derive(sqlx::FromRow)]
struct RestaurantRow {
    restaurant_id: String,
    name: String,
    cuisine: String,
    borough: String,
    building: String,
    street: String,
    zipcode: String,
    average_rating: f64,
}

impl From<RestaurantRow> for Restaurant {
    fn from(row: RestaurantRow) -> Self {
        Self {
            restaurant_id: row.restaurant_id,
            name: row.name,
            cuisine: row.cuisine,
            borough: row.borough,
            address: Address {
                building: row.building,
                street: row.street,
                zipcode: row.zipcode,
            },
            average_rating: row.average_rating,
        }
    }
}

/// The unfiltered listing: a handful of restaurants ordered by cuisine, descending.
pub async fn featured_restaurants(db_conn: &SqlitePool) -> anyhow::Result<Vec<Restaurant>> {
    let sql = format!("{SELECT_RESTAURANT} ORDER BY r.cuisine DESC, r.restaurant_id LIMIT ?");
    let rows = sqlx::query_as::<_, RestaurantRow>(&sql)
        .bind(FEATURED_LIMIT)
        .fetch_all(db_conn)
        .await
        .with_context(|| "fail to get featured restaurants")?;

    Ok(rows.into_iter().map(Restaurant::from).collect())
}

#[derive(Builder, Debug, Clone)]
#[builder(build_fn(validate = "Self::validate"))]
pub struct RestaurantQuery {
    #[builder(default)]
    sort_by: SortBy,
    #[builder(default)]
    order: Order,
    #[builder(default = "15")]
    limit: u32,
    /// Case-insensitive substring of the cuisine.
    #[builder(setter(into, strip_option), default)]
    cuisine: Option<String>,
    /// Exact borough name.
    #[builder(setter(into, strip_option), default)]
    borough: Option<String>,
}

impl RestaurantQueryBuilder {
    fn validate(&self) -> Result<(), String> {
        match self.limit {
            Some(0) => Err("limit must be at least 1".to_string()),
            _ => Ok(()),
        }
    }
}

impl RestaurantQuery {
    fn to_sql(&self) -> String {
        let mut sql = String::from(SELECT_RESTAURANT);

        let mut conditions = Vec::new();
        if self.cuisine.is_some() {
            conditions.push("instr(lower(r.cuisine), lower(?)) > 0");
        }
        if self.borough.is_some() {
            conditions.push("r.borough = ?");
        }
        if !conditions.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&conditions.join(" AND "));
        }

        let direction = match self.order {
            Order::Asc => "ASC",
            Order::Desc => "DESC",
        };
        let order_by = match self.sort_by {
            SortBy::Name => format!("r.name COLLATE NOCASE {direction}"),
            SortBy::AverageRating => format!("average_rating {direction}, r.name COLLATE NOCASE"),
        };
        sql.push_str(&format!(" ORDER BY {order_by}, r.restaurant_id LIMIT ?"));
        sql
    }
}

/// Filter, sort, then truncate to the query's limit.
pub async fn query_restaurants(
    db_conn: &SqlitePool,
    props: &RestaurantQuery,
) -> anyhow::Result<Vec<Restaurant>> {
    let sql = props.to_sql();
    let mut query = sqlx::query_as::<_, RestaurantRow>(&sql);
    if let Some(cuisine) = &props.cuisine {
        query = query.bind(cuisine.as_str());
    }
    if let Some(borough) = &props.borough {
        query = query.bind(borough.as_str());
    }

    let rows = query
        .bind(i64::from(props.limit))
        .fetch_all(db_conn)
        .await
        .with_context(|| "fail to query restaurants")?;

    Ok(rows.into_iter().map(Restaurant::from).collect())
}

/// Distinct cuisines, skipping combined values such as `Latin (Cuban, Dominican)/Other`.
pub async fn distinct_cuisines(db_conn: &SqlitePool) -> anyhow::Result<Vec<String>> {
    sqlx::query_scalar::<_, String>(
        "SELECT DISTINCT cuisine FROM restaurant WHERE instr(cuisine, '/') = 0 ORDER BY cuisine",
    )
    .fetch_all(db_conn)
    .await
    .with_context(|| "fail to get cuisines")
}

pub async fn distinct_boroughs(db_conn: &SqlitePool) -> anyhow::Result<Vec<String>> {
    sqlx::query_scalar::<_, String>(
        "SELECT DISTINCT borough FROM restaurant WHERE instr(borough, '/') = 0 ORDER BY borough",
    )
    .fetch_all(db_conn)
    .await
    .with_context(|| "fail to get boroughs")
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn memory_db() -> SqlitePool {
        connect("sqlite::memory:", 1).await.unwrap()
    }

    async fn add_restaurant(
        db: &SqlitePool,
        id: &str,
        name: &str,
        cuisine: &str,
        borough: &str,
        scores: &[i64],
    ) {
        sqlx::query(
            "INSERT INTO restaurant
                 (restaurant_id, name, cuisine, borough, building, street, zipcode)
             VALUES (?, ?, ?, ?, '1', 'Main Street', '10001')",
        )
        .bind(id)
        .bind(name)
        .bind(cuisine)
        .bind(borough)
        .execute(db)
        .await
        .unwrap();

        for &score in scores {
            sqlx::query("INSERT INTO grade (restaurant, score) VALUES (?, ?)")
                .bind(id)
                .bind(score)
                .execute(db)
                .await
                .unwrap();
        }
    }

    async fn seeded_db() -> SqlitePool {
        let db = memory_db().await;
        add_restaurant(&db, "1", "Luigi's", "Italian", "Brooklyn", &[2, 4]).await;
        add_restaurant(&db, "2", "bella Napoli", "Italian", "Manhattan", &[9]).await;
        add_restaurant(&db, "3", "Wok Inn", "Chinese", "Queens", &[5, 5, 8]).await;
        add_restaurant(&db, "4", "Taco Loco", "Mexican", "Brooklyn", &[]).await;
        add_restaurant(&db, "5", "Zeytin", "Turkish", "Bronx", &[12]).await;
        add_restaurant(&db, "6", "Arepa Lady", "Latin/Other", "Queens/Elmhurst", &[7]).await;
        db
    }

    fn names(restaurants: &[Restaurant]) -> Vec<&str> {
        restaurants.iter().map(|r| r.name.as_str()).collect()
    }

    #[tokio::test]
    async fn featured_is_capped_and_cuisine_descending() {
        let db = seeded_db().await;

        let featured = featured_restaurants(&db).await.unwrap();
        assert_eq!(featured.len(), 4);
        let cuisines: Vec<_> = featured.iter().map(|r| r.cuisine.as_str()).collect();
        assert_eq!(cuisines, ["Turkish", "Mexican", "Latin/Other", "Italian"]);
    }

    #[tokio::test]
    async fn featured_on_empty_collection() {
        let db = memory_db().await;
        assert!(featured_restaurants(&db).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn average_rating_is_mean_of_grades() {
        let db = seeded_db().await;
        let query = RestaurantQueryBuilder::default().build().unwrap();

        let restaurants = query_restaurants(&db, &query).await.unwrap();
        let luigi = restaurants.iter().find(|r| r.restaurant_id == "1").unwrap();
        assert_eq!(luigi.average_rating, 3.0);
        let taco = restaurants.iter().find(|r| r.restaurant_id == "4").unwrap();
        assert_eq!(taco.average_rating, 0.0);
        assert_eq!(taco.address.street, "Main Street");
    }

    #[tokio::test]
    async fn default_query_sorts_by_rating_descending() {
        let db = seeded_db().await;
        let query = RestaurantQueryBuilder::default().build().unwrap();

        let restaurants = query_restaurants(&db, &query).await.unwrap();
        assert_eq!(
            names(&restaurants),
            ["Zeytin", "bella Napoli", "Arepa Lady", "Wok Inn", "Luigi's", "Taco Loco"]
        );
    }

    #[tokio::test]
    async fn name_sort_ignores_case_and_limit_applies_after_sort() {
        let db = seeded_db().await;
        let query = RestaurantQueryBuilder::default()
            .sort_by(SortBy::Name)
            .order(Order::Asc)
            .limit(3u32)
            .build()
            .unwrap();

        let restaurants = query_restaurants(&db, &query).await.unwrap();
        assert_eq!(names(&restaurants), ["Arepa Lady", "bella Napoli", "Luigi's"]);
    }

    #[tokio::test]
    async fn cuisine_filter_is_case_insensitive_substring() {
        let db = seeded_db().await;
        let query = RestaurantQueryBuilder::default()
            .cuisine("ital")
            .build()
            .unwrap();

        let restaurants = query_restaurants(&db, &query).await.unwrap();
        assert_eq!(restaurants.len(), 2);
        assert!(restaurants.iter().all(|r| r.cuisine == "Italian"));
    }

    #[tokio::test]
    async fn cuisine_filter_treats_pattern_characters_literally() {
        let db = seeded_db().await;
        let query = RestaurantQueryBuilder::default()
            .cuisine("%")
            .build()
            .unwrap();

        assert!(query_restaurants(&db, &query).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn borough_filter_is_exact_and_combines_with_cuisine() {
        let db = seeded_db().await;
        let query = RestaurantQueryBuilder::default()
            .cuisine("Italian")
            .borough("Brooklyn")
            .build()
            .unwrap();

        let restaurants = query_restaurants(&db, &query).await.unwrap();
        assert_eq!(names(&restaurants), ["Luigi's"]);

        let query = RestaurantQueryBuilder::default()
            .borough("brooklyn")
            .build()
            .unwrap();
        assert!(query_restaurants(&db, &query).await.unwrap().is_empty());
    }

    #[test]
    fn zero_limit_is_rejected() {
        let err = RestaurantQueryBuilder::default().limit(0u32).build();
        assert!(err.is_err());
    }

    #[tokio::test]
    async fn distinct_values_skip_combined_entries() {
        let db = seeded_db().await;

        let cuisines = distinct_cuisines(&db).await.unwrap();
        assert_eq!(cuisines, ["Chinese", "Italian", "Mexican", "Turkish"]);

        let boroughs = distinct_boroughs(&db).await.unwrap();
        assert_eq!(boroughs, ["Bronx", "Brooklyn", "Manhattan", "Queens"]);
    }
}
