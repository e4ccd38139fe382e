//! 门诊排队演示程序
//!
//! 展示排队核心流程：登记分诊、实时排序、紧急升级与就诊状态推进

use opd_core::{Patient, PatientStatus, RegistrationForm, Symptom};
use opd_store::{MemoryPatientStore, PatientStore};
use opd_workflow::{
    CredentialTable, MutationGateway, QueueProjection, RegistrationService,
};
use std::sync::Arc;
use tokio::sync::mpsc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 初始化日志
    tracing_subscriber::fmt::init();

    println!("🏥 OPD 门诊排队演示\n");

    let store: Arc<dyn PatientStore> = Arc::new(MemoryPatientStore::new());
    let registration = RegistrationService::new(store.clone());
    let gateway = MutationGateway::new(store.clone());
    let projection = QueueProjection::new(store);

    // 1. 角色登录
    let credentials = CredentialTable::default();
    let admin = credentials.authenticate("admin", "admin123")?;
    let doctor = credentials.authenticate("doctor", "doctor123")?;
    println!("✅ 管理员与医生登录完成");

    // 2. 三位患者依次登记
    let a = registration
        .register(form("A", 34, Symptom::Cold, None))
        .await?;
    let b = registration
        .register(form("B", 52, Symptom::Fever, None))
        .await?;
    let c = registration
        .register(form("C", 27, Symptom::Headache, None))
        .await?;
    println!(
        "✅ 登记了 3 位患者，队列号分别为 {}、{}、{}",
        a.queue_number, b.queue_number, c.queue_number
    );

    // 3. 订阅实时队列
    let (tx, mut rx) = mpsc::unbounded_channel();
    let subscription = projection
        .watch_queue(move |queue| {
            let _ = tx.send(queue);
        })
        .await?;

    let initial = rx.recv().await.expect("queue subscription closed");
    print_queue("初始队列（全部正常，先来先到）", &initial);

    // 4. 管理员把B升级为紧急，立即重排到队首
    gateway.escalate_to_emergency(&admin, b.id).await?;
    let escalated = rx.recv().await.expect("queue subscription closed");
    print_queue("B 升级为紧急后", &escalated);

    // 5. 医生推进A的就诊状态直至完成，A沉底
    gateway
        .set_status(&doctor, a.id, PatientStatus::InConsultation)
        .await?;
    rx.recv().await.expect("queue subscription closed");
    gateway
        .set_status(&doctor, a.id, PatientStatus::Completed)
        .await?;
    let completed = rx.recv().await.expect("queue subscription closed");
    print_queue("A 完成就诊后", &completed);

    // 6. 患者视角：C在活跃队列中的位次
    if let Some(position) = projection.position_snapshot(c.id).await? {
        println!("🔢 患者 C 当前位次: {}", position);
    }

    // 7. 队列统计
    let stats = projection.stats_snapshot().await?;
    println!("\n📊 队列统计:");
    println!("   总人数: {}", stats.total);
    println!("   候诊: {}", stats.waiting);
    println!("   就诊中: {}", stats.in_consultation);
    println!("   已完成: {}", stats.completed);
    println!("   活跃紧急: {}", stats.emergency_active);

    subscription.cancel();
    println!("\n🎉 演示完成");
    Ok(())
}

fn form(name: &str, age: u32, symptom: Symptom, notes: Option<&str>) -> RegistrationForm {
    RegistrationForm {
        name: name.to_string(),
        age,
        symptom,
        notes: notes.map(|n| n.to_string()),
    }
}

fn print_queue(title: &str, queue: &[Patient]) {
    println!("\n📋 {}:", title);
    for patient in queue {
        println!(
            "   {}号 {} - {} ({:?}/{:?})",
            patient.queue_number,
            patient.name,
            patient.symptom.label(),
            patient.critical_level,
            patient.status
        );
    }
}
