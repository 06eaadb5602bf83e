use crate::api::User;

/// Case-insensitive substring match over first name, last name and email.
/// An empty (or whitespace-only) query matches everything.
pub fn matches_query(user: &User, query: &str) -> bool {
    let q = query.trim().to_lowercase();
    if q.is_empty() {
        return true;
    }
    user.first_name.to_lowercase().contains(&q)
        || user.last_name.to_lowercase().contains(&q)
        || user.email.to_lowercase().contains(&q)
}

/// Keep the users matching `query`, in their original order.
pub fn filter_users<'a, I>(users: I, query: &str) -> Vec<User>
where
    I: IntoIterator<Item = &'a User>,
{
    users
        .into_iter()
        .filter(|u| matches_query(u, query))
        .cloned()
        .collect()
}
