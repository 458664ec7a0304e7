use dotenv::dotenv;
use log::{LevelFilter, info};

use rozklad_scraper::{FacultyScraper, GroupScraper, Schedule, ScheduleScraper, ScrapingContext};

fn print_schedule(schedule: &Schedule) {
    for day in &schedule.days {
        println!("{}:", day.day);
        for pair in &day.pairs {
            if pair.lessons.is_empty() {
                continue;
            }
            println!("  {}:", pair.number);
            for lesson in &pair.lessons {
                println!(
                    "    {}: {} - {}",
                    lesson.date, lesson.teacher.short, lesson.subject.short
                );
                if !lesson.info.is_empty() {
                    println!("    {}", lesson.info);
                }
            }
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    env_logger::Builder::new()
        .filter_level(LevelFilter::Info)
        .init();

    // Usage: rozklad-scraper [faculty-name [group-name]]
    // With no args the faculty list is printed; with one arg, its groups.
    let mut args = std::env::args().skip(1);
    let faculty_name = args.next();
    let group_name = args.next();

    let ctx = ScrapingContext::new()?;

    let faculties = FacultyScraper.scrape(&ctx).await?;
    info!("found {} faculties", faculties.len());
    let Some(faculty_name) = faculty_name else {
        for faculty in &faculties {
            println!("{}", faculty.name);
        }
        return Ok(());
    };
    let Some(faculty) = faculties.iter().find(|faculty| faculty.name == faculty_name) else {
        anyhow::bail!("no faculty named {faculty_name:?}");
    };

    let groups = GroupScraper {
        faculty_id: faculty.id.clone(),
    }
    .scrape(&ctx)
    .await?;
    info!("found {} groups under {}", groups.len(), faculty.name);
    let Some(group_name) = group_name else {
        for group in &groups {
            println!("{}", group.name);
        }
        return Ok(());
    };
    let Some(group) = groups.iter().find(|group| group.name == group_name) else {
        anyhow::bail!("no group named {group_name:?} under {}", faculty.name);
    };

    let schedule = ScheduleScraper {
        group_id: group.id.clone(),
        full_term: true,
    }
    .scrape(&ctx)
    .await?;
    print_schedule(&schedule);

    Ok(())
}
