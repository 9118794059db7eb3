use crate::models::Draw;
use crate::models::schema::resultados;
use diesel::dsl::{max, min};
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;

/// `INSERT ... ON CONFLICT (concurso) DO NOTHING`
/// Returns `true` if the row was written, `false` if the draw was already stored
pub fn insert_draw(connection: &mut SqliteConnection, draw: &Draw) -> anyhow::Result<bool> {
    diesel::insert_into(resultados::table)
        .values(draw)
        .on_conflict(resultados::concurso)
        .do_nothing()
        .execute(connection)
        .map(|count| count == 1)
        .map_err(|e| anyhow::anyhow!("Error inserting draw {}: {e}", draw.draw_number))
}

pub fn get_draw_number_bounds(
    connection: &mut SqliteConnection,
) -> anyhow::Result<Option<(i64, i64)>> {
    let (lowest, highest) = resultados::table
        .select((min(resultados::concurso), max(resultados::concurso)))
        .first::<(Option<i64>, Option<i64>)>(connection)
        .map_err(|e| anyhow::anyhow!("Error reading draw number bounds: {e}"))?;

    Ok(lowest.zip(highest))
}

pub fn get_draw_numbers_between(
    connection: &mut SqliteConnection,
    from: i64,
    to: i64,
) -> anyhow::Result<Vec<i64>> {
    resultados::table
        .select(resultados::concurso)
        .filter(resultados::concurso.between(from, to))
        .order(resultados::concurso.asc())
        .load::<i64>(connection)
        .map_err(|e| anyhow::anyhow!("Error loading draw numbers {from}..={to}: {e}"))
}

pub fn get_draw_by_number(
    connection: &mut SqliteConnection,
    draw_number: i64,
) -> anyhow::Result<Option<Draw>> {
    resultados::table
        .find(draw_number)
        .select(Draw::as_select())
        .first(connection)
        .optional()
        .map_err(|e| anyhow::anyhow!("Error finding draw {draw_number}: {e}"))
}

/// Newest first
pub fn get_latest_draws(connection: &mut SqliteConnection, limit: i64) -> anyhow::Result<Vec<Draw>> {
    resultados::table
        .select(Draw::as_select())
        .order(resultados::concurso.desc())
        .limit(limit)
        .load(connection)
        .map_err(|e| anyhow::anyhow!("Error loading latest {limit} draws: {e}"))
}

pub fn count_draws(connection: &mut SqliteConnection) -> anyhow::Result<i64> {
    resultados::table
        .count()
        .get_result(connection)
        .map_err(|e| anyhow::anyhow!("Error counting draws: {e}"))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::db::{Datastore, DrawStore as _};

    const NUMBERS: [u8; 15] = [1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15];

    fn store() -> anyhow::Result<Datastore> {
        let store = Datastore::in_memory()?;
        store.migrate()?;
        Ok(store)
    }

    fn draw(draw_number: i64) -> Draw {
        Draw::new(draw_number, "05/12/2025", &NUMBERS).expect("valid draw")
    }

    #[test]
    fn second_insert_of_same_draw_is_a_noop() -> anyhow::Result<()> {
        let store = store()?;

        assert!(store.insert_draw(&draw(7))?);
        let mut changed = draw(7);
        changed.numbers = "25 24 23 22 21 20 19 18 17 16 15 14 13 12 11".to_owned();
        assert!(!store.insert_draw(&changed)?);

        assert_eq!(store.count_draws()?, 1);
        assert_eq!(store.get_draw(7)?, Some(draw(7)));
        Ok(())
    }

    #[test]
    fn bounds_and_ranges_ignore_insertion_order() -> anyhow::Result<()> {
        let store = store()?;
        for n in [9, 3, 5, 4] {
            store.insert_draw(&draw(n))?;
        }

        assert_eq!(store.draw_number_bounds()?, Some((3, 9)));
        assert_eq!(store.draw_numbers_between(4, 9)?, vec![4, 5, 9]);
        assert_eq!(store.draw_numbers_between(10, 20)?, Vec::<i64>::new());
        Ok(())
    }

    #[test]
    fn latest_draws_are_newest_first_and_limited() -> anyhow::Result<()> {
        let store = store()?;
        for n in 1..=5 {
            store.insert_draw(&draw(n))?;
        }

        let latest: Vec<i64> = store
            .latest_draws(3)?
            .into_iter()
            .map(|d| d.draw_number)
            .collect();
        assert_eq!(latest, vec![5, 4, 3]);
        Ok(())
    }

    #[test]
    fn missing_draw_is_none() -> anyhow::Result<()> {
        let store = store()?;
        assert_eq!(store.get_draw(42)?, None);
        Ok(())
    }
}
