//! JSON:API type names: clients send dashes where collection names use underscores.

/// `"blog-posts"` -> `"blog_posts"`.
pub fn type_to_collection(type_name: &str) -> String {
    type_name.replace('-', "_")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dashes_become_underscores() {
        assert_eq!(type_to_collection("blog-posts"), "blog_posts");
        assert_eq!(type_to_collection("people"), "people");
    }
}
