//! Wipes the configured database and fills it with demo data.

use anyhow::Result;
use rand::Rng;
use rand::seq::IndexedRandom;
use tracing::info;
use uuid::Uuid;

use nstconnect_api::auth::hash_password;
use nstconnect_db::{Database, NewNotification, NewUser, ProfileUpdate};
use nstconnect_server::config;
use nstconnect_types::models::NotificationType;

const PASSWORD: &str = "password123";
const POST_COUNT: usize = 30;
const MESSAGE_COUNT: usize = 20;
const NOTIFICATION_COUNT: usize = 15;

const USERS: &[(&str, &str)] = &[
    ("Rahul Sharma", "rahul@nst.edu"),
    ("Priya Patel", "priya@nst.edu"),
    ("Arjun Kumar", "arjun@nst.edu"),
    ("Sneha Reddy", "sneha@nst.edu"),
    ("Vikram Singh", "vikram@nst.edu"),
    ("Ananya Iyer", "ananya@nst.edu"),
    ("Rohan Gupta", "rohan@nst.edu"),
    ("Kavya Nair", "kavya@nst.edu"),
    ("Aditya Verma", "aditya@nst.edu"),
    ("Ishita Joshi", "ishita@nst.edu"),
    ("Karan Mehta", "karan@nst.edu"),
    ("Diya Shah", "diya@nst.edu"),
    ("Siddharth Rao", "siddharth@nst.edu"),
    ("Meera Desai", "meera@nst.edu"),
    ("Aarav Kapoor", "aarav@nst.edu"),
];

const DEPARTMENTS: &[&str] = &["Computer Science", "Electronics", "Mechanical", "Civil", "IT", "Chemical"];

const SKILLS: &[&str] = &[
    "JavaScript,React,Node.js",
    "Python,Django,Machine Learning",
    "Java,Spring Boot,Microservices",
    "C++,Data Structures,Algorithms",
    "React Native,Mobile Development,UI/UX",
    "DevOps,Docker,Kubernetes",
    "Data Science,Python,TensorFlow",
    "Full Stack,MERN,PostgreSQL",
];

const HEADLINES: &[&str] = &[
    "Passionate Software Developer | Open Source Contributor",
    "Full Stack Developer | Tech Enthusiast",
    "AI/ML Engineer | Research Enthusiast",
    "Mobile App Developer | React Native Expert",
    "Backend Developer | Cloud Architecture",
    "Frontend Developer | UI/UX Designer",
    "DevOps Engineer | Automation Specialist",
    "Data Scientist | Analytics Expert",
];

const BIOS: &[&str] = &[
    "Love building scalable applications and contributing to open source.",
    "Passionate about creating beautiful user experiences. Coffee lover.",
    "Machine Learning enthusiast working on exciting AI projects. Let's connect!",
    "Building mobile apps that make a difference. Tech blogger and speaker.",
    "Cloud architecture and microservices are my thing.",
    "Design-focused developer who loves clean code and pixel-perfect UIs.",
    "Automating everything! DevOps culture advocate and continuous learner.",
    "Turning data into insights. Python enthusiast and Kaggle competitor.",
];

const POSTS: &[&str] = &[
    "Just finished an amazing project on machine learning! #AI #MachineLearning",
    "Looking for collaborators on an open-source project. DM me if interested!",
    "Attended an awesome tech conference today. So many inspiring talks!",
    "Finally deployed my app to production! Feeling accomplished.",
    "Who else is excited about the new React features?",
    "Coffee + Code = Perfect combo. What's your coding fuel?",
    "Just got my AWS certification! Hard work pays off.",
    "Working on a cool side project this weekend. Stay tuned!",
    "Best practices for API design: what are your thoughts?",
    "Debugging is like being the detective in a crime movie where you are also the murderer.",
    "Excited to announce I'll be speaking at the upcoming tech meetup!",
    "Just discovered a library that solves a problem I've been struggling with!",
    "Team collaboration makes everything better. Grateful for my colleagues!",
    "Learning a new programming language this month. Any recommendations?",
    "The feeling when your code works on the first try... priceless!",
];

const COMMENTS: &[&str] = &[
    "Great work! Keep it up!",
    "This is awesome! Can you share more details?",
    "Congratulations! Well deserved!",
    "I'd love to collaborate on this!",
    "Very interesting perspective!",
    "Thanks for sharing this!",
    "This is exactly what I needed!",
    "Amazing! How did you do this?",
    "Inspiring! Keep sharing your journey!",
    "Would love to learn more about this!",
];

const MESSAGES: &[&str] = &[
    "Hey! How are you doing?",
    "Did you see the latest project updates?",
    "Want to grab coffee sometime?",
    "Thanks for your help yesterday!",
    "Let's collaborate on that project!",
    "Great presentation today!",
    "Can you share those notes?",
    "See you at the meetup!",
];

#[derive(Debug, Default, PartialEq)]
struct Summary {
    users: usize,
    friendships: usize,
    posts: usize,
    comments: usize,
    likes: usize,
    messages: usize,
    notifications: usize,
}

fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    nstconnect_server::init_tracing();

    let db_path = config::db_path_from_env();
    let db = Database::open(&db_path)?;

    info!("Clearing existing data in {}", db_path.display());
    db.wipe()?;

    let summary = seed(&db, &mut rand::rng())?;

    info!(
        "Seeded {} users, {} friendships, {} posts, {} comments, {} likes, {} messages, {} notifications",
        summary.users,
        summary.friendships,
        summary.posts,
        summary.comments,
        summary.likes,
        summary.messages,
        summary.notifications
    );
    info!("Log in as any seeded user (e.g. {}) with password '{}'", USERS[0].1, PASSWORD);
    Ok(())
}

fn seed(db: &Database, rng: &mut impl Rng) -> Result<Summary> {
    let mut summary = Summary::default();

    // All demo accounts share one password, so hash it once.
    let password_hash = hash_password(PASSWORD)?;

    let mut users = Vec::with_capacity(USERS.len());
    for (i, &(name, email)) in USERS.iter().enumerate() {
        let id = new_id();
        db.create_user(&NewUser {
            id: &id,
            name,
            email,
            password_hash: &password_hash,
            department: Some(DEPARTMENTS[i % DEPARTMENTS.len()]),
            graduation_year: Some(2024 + (i % 4) as i32),
        })?;

        let linkedin = format!("https://linkedin.com/in/{}", name.to_lowercase().replacen(' ', "-", 1));
        let github = format!("https://github.com/{}", name.to_lowercase().replace(' ', ""));
        db.update_profile(
            &id,
            &ProfileUpdate {
                bio: Some(BIOS[i % BIOS.len()]),
                headline: Some(HEADLINES[i % HEADLINES.len()]),
                skills: Some(SKILLS[i % SKILLS.len()]),
                linkedin_url: Some(&linkedin),
                github_url: Some(&github),
                ..Default::default()
            },
        )?;
        users.push(id);
    }
    summary.users = users.len();

    // Each user befriends 3-6 others; overlapping picks collapse into one pair.
    for (i, user) in users.iter().enumerate() {
        let wanted = rng.random_range(3..=6);
        let others = rand::seq::index::sample(rng, users.len(), wanted + 1)
            .into_iter()
            .filter(|&j| j != i)
            .take(wanted);
        for j in others {
            if db.are_friends(user, &users[j])? {
                continue;
            }
            db.create_friendship(user, &users[j])?;
            summary.friendships += 1;
        }
    }

    let mut posts = Vec::with_capacity(POST_COUNT);
    for i in 0..POST_COUNT {
        let id = new_id();
        db.insert_post(&id, pick_user(rng, &users), POSTS[i % POSTS.len()], None)?;
        posts.push(id);
    }
    summary.posts = posts.len();

    for post in &posts {
        for _ in 0..rng.random_range(0..=4) {
            db.insert_comment(&new_id(), post, pick_user(rng, &users), pick(rng, COMMENTS))?;
            summary.comments += 1;
        }

        let likers = rng.random_range(1..=8).min(users.len());
        for j in rand::seq::index::sample(rng, users.len(), likers) {
            if db.toggle_like(&new_id(), post, &users[j])? {
                summary.likes += 1;
            }
        }
    }

    for _ in 0..MESSAGE_COUNT {
        let pair = rand::seq::index::sample(rng, users.len(), 2);
        let (sender, receiver) = (&users[pair.index(0)], &users[pair.index(1)]);
        db.insert_message(&new_id(), sender, receiver, pick(rng, MESSAGES))?;
        if rng.random_bool(0.5) {
            db.mark_thread_read(receiver, sender)?;
        }
        summary.messages += 1;
    }

    let kinds = [
        (NotificationType::Like, "Someone liked your post!"),
        (NotificationType::Comment, "Someone commented on your post!"),
        (NotificationType::FriendAccepted, "Your friend request was accepted!"),
    ];
    for _ in 0..NOTIFICATION_COUNT {
        let id = new_id();
        let user = pick_user(rng, &users);
        let (kind, message) = kinds[rng.random_range(0..kinds.len())];
        db.create_notification(&NewNotification {
            id: &id,
            user_id: user,
            kind,
            reference_id: None,
            message,
        })?;
        if rng.random_bool(0.4) {
            db.mark_notification_read(&id, user)?;
        }
        summary.notifications += 1;
    }

    Ok(summary)
}

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

fn pick<'a>(rng: &mut impl Rng, items: &[&'a str]) -> &'a str {
    items.choose(rng).copied().unwrap_or_default()
}

fn pick_user<'a>(rng: &mut impl Rng, users: &'a [String]) -> &'a str {
    &users[rng.random_range(0..users.len())]
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    #[test]
    fn seeding_fills_every_table() {
        let db = Database::open_in_memory().unwrap();
        let summary = seed(&db, &mut StdRng::seed_from_u64(7)).unwrap();

        assert_eq!(summary.users, USERS.len());
        assert_eq!(summary.posts, POST_COUNT);
        assert_eq!(summary.messages, MESSAGE_COUNT);
        assert_eq!(summary.notifications, NOTIFICATION_COUNT);
        assert!(summary.friendships >= USERS.len() * 3 / 2);
        assert!(summary.likes >= POST_COUNT);

        let rahul = db.get_user_by_email("rahul@nst.edu").unwrap().unwrap();
        assert_eq!(rahul.linkedin_url.as_deref(), Some("https://linkedin.com/in/rahul-sharma"));
        assert_eq!(rahul.github_url.as_deref(), Some("https://github.com/rahulsharma"));

        let friends = db.get_friends(&rahul.id).unwrap();
        assert!(friends.len() >= 3);
        for friend in friends {
            assert!(db.are_friends(&friend.id, &rahul.id).unwrap());
        }

        assert_eq!(db.get_feed(&rahul.id, 50, 0).unwrap().len(), POST_COUNT);
    }

    #[test]
    fn reseeding_after_wipe_starts_clean() {
        let db = Database::open_in_memory().unwrap();
        seed(&db, &mut StdRng::seed_from_u64(1)).unwrap();
        db.wipe().unwrap();
        let summary = seed(&db, &mut StdRng::seed_from_u64(2)).unwrap();
        assert_eq!(summary.users, USERS.len());
    }
}
