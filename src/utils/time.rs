
use chrono::NaiveDate;


/// This is the standard way of deriving a task name in perftrack: weekday
/// abbreviation followed by day.month, e.g. "Mon01.05" for May 1st.
pub fn task_name_for(date: NaiveDate) -> String {
    date.format("%a%d.%m").to_string()
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::task_name_for;

    #[test]
    fn task_name_uses_weekday_and_day_month() {
        // 2024-05-01 was a Wednesday.
        let date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        assert_eq!(task_name_for(date), "Wed01.05");

        let date = NaiveDate::from_ymd_opt(2024, 12, 30).unwrap();
        assert_eq!(task_name_for(date), "Mon30.12");
    }
}
