//! The `report` subcommand: mirror counts plus anomaly checks.
//!
//! Prints group and article totals, then checks for conditions that should
//! never occur after a healthy sync: duplicate external ids and active
//! articles parked in inactive groups. Any anomaly makes the process exit
//! non-zero so cron wrappers and CI notice.

pub(crate) async fn run() -> anyhow::Result<()> {
    let pool = slsync_db::connect_pool_from_env().await?;

    let groups = slsync_db::count_groups(&pool).await?;
    let articles = slsync_db::count_articles(&pool).await?;

    println!("article groups : {} total ({} active, {} inactive)",
        groups.total, groups.active, groups.inactive);
    println!("articles       : {} total ({} active, {} inactive)",
        articles.total, articles.active, articles.inactive);
    println!("enriched       : {}", articles.enriched);

    let duplicate_groups = slsync_db::count_duplicate_group_external_ids(&pool).await?;
    let duplicate_articles = slsync_db::count_duplicate_article_external_ids(&pool).await?;
    let orphaned = slsync_db::count_orphaned_articles(&pool).await?;

    let mut anomalies = 0_i64;
    if duplicate_groups > 0 {
        println!("ANOMALY: {duplicate_groups} duplicated group external id(s)");
        anomalies += duplicate_groups;
    }
    if duplicate_articles > 0 {
        println!("ANOMALY: {duplicate_articles} duplicated article external id(s)");
        anomalies += duplicate_articles;
    }
    if orphaned > 0 {
        println!("ANOMALY: {orphaned} active article(s) in inactive groups");
        anomalies += orphaned;
    }

    if anomalies > 0 {
        anyhow::bail!("{anomalies} anomaly(ies) found in the mirror");
    }

    println!("no anomalies");
    Ok(())
}
