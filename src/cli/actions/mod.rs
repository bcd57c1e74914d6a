pub mod posts;
pub mod session;

use secrecy::SecretString;

#[derive(Debug)]
pub enum Action {
    Register {
        email: String,
        password: SecretString,
        name: Option<String>,
        photo: Option<String>,
    },
    Login {
        email: String,
        password: SecretString,
    },
    LoginIdp {
        assertion: String,
    },
    Logout,
    Status,
    Posts {
        search: Option<String>,
        upcoming: bool,
    },
    Post {
        id: String,
    },
    MyPosts,
    MyApplications,
    AddPost {
        title: String,
        description: String,
        category: String,
        location: String,
        volunteers_needed: i64,
        deadline: String,
        thumbnail: Option<String>,
    },
    DeletePost {
        id: String,
    },
    Apply {
        id: String,
    },
    Withdraw {
        id: String,
    },
}
